//! srs: command-line front end for the spaced repetition scheduler.
//!
//! Every invocation loads the collection from SQLite, applies one command
//! and writes the collection back if the command changed it.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use srs_scheduler::config::Config;
use srs_scheduler::database::db;
use srs_scheduler::export::json::{export_json_to_path, import_json};
use srs_scheduler::models::{CardContent, sm2::MAX_INTERVAL_DAYS};
use srs_scheduler::{Collection, Quality, ReviewResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "srs", version, about = "SM-2 spaced repetition scheduler")]
struct Cli {
    /// Config file path
    #[arg(long, env = "SRS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, env = "SRS_DATABASE", global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new card
    Add {
        id: String,
        #[arg(long, default_value = "")]
        question: String,
        #[arg(long, default_value = "")]
        answer: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show a single card
    Show { id: String },

    /// List all cards
    List,

    /// List cards that are due now
    Due,

    /// List due cards in study order, most overdue first
    Study,

    /// Remove a card
    Remove { id: String },

    /// Show the review history of a card
    History { id: String },

    /// Start a study session and print it
    StartSession,

    /// Submit a review for a card within an open session
    Review {
        session: String,
        card: String,
        /// Recall quality, 0-5
        #[arg(value_parser = parse_quality)]
        quality: Quality,
        /// Response time in milliseconds
        #[arg(long, default_value = "0")]
        response_ms: u64,
        /// Your own verdict (defaults to quality >= 3)
        #[arg(long)]
        correct: Option<bool>,
    },

    /// End a study session
    EndSession { session: String },

    /// Show a study session
    Session { id: String },

    /// Show aggregate statistics
    Stats,

    /// Show review counts per day
    Upcoming {
        /// Number of days starting today (defaults to the configured value)
        #[arg(long, value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_INTERVAL_DAYS)))]
        days: Option<u32>,
    },

    /// Write the collection to a JSON file
    Export { path: PathBuf },

    /// Replace the collection with the contents of a JSON file
    Import { path: PathBuf },

    /// Delete all cards and sessions
    Reset,
}

fn parse_quality(value: &str) -> std::result::Result<Quality, String> {
    let raw: u8 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number between 0 and 5"))?;
    Quality::new(raw).map_err(|err| err.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli, config) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let database_path = cli.database.unwrap_or(config.database_path);
    let mut conn = db::init_database(&database_path)
        .with_context(|| format!("failed to open database {}", database_path.display()))?;

    let mut collection = Collection::new();
    collection.import_state(db::load_snapshot(&conn)?)?;

    let mutated = match cli.command {
        Commands::Add {
            id,
            question,
            answer,
            tags,
        } => {
            let content = CardContent {
                question,
                answer,
                tags,
            };
            print_json(&collection.add_card_with_content(id, content)?)?;
            true
        }
        Commands::Show { id } => {
            let card = collection
                .get_card(&id)
                .with_context(|| format!("card not found: {id}"))?;
            print_json(card)?;
            false
        }
        Commands::List => {
            let mut cards = collection.all_cards();
            cards.sort_by(|a, b| a.id.cmp(&b.id));
            print_json(&cards)?;
            false
        }
        Commands::Due => {
            let mut cards = collection.due_cards();
            cards.sort_by(|a, b| a.id.cmp(&b.id));
            print_json(&cards)?;
            false
        }
        Commands::Study => {
            print_json(&collection.study_queue())?;
            false
        }
        Commands::Remove { id } => {
            print_json(&collection.remove_card(&id)?)?;
            true
        }
        Commands::History { id } => {
            print_json(&collection.card_history(&id)?)?;
            false
        }
        Commands::StartSession => {
            print_json(&collection.start_session())?;
            true
        }
        Commands::Review {
            session,
            card,
            quality,
            response_ms,
            correct,
        } => {
            let result = ReviewResult::new(
                card,
                quality,
                response_ms,
                correct.unwrap_or(quality.is_correct()),
                collection.now(),
            );
            print_json(&collection.submit_review(&session, result)?)?;
            true
        }
        Commands::EndSession { session } => {
            print_json(&collection.end_session(&session)?)?;
            true
        }
        Commands::Session { id } => {
            let session = collection
                .get_session(&id)
                .with_context(|| format!("session not found: {id}"))?;
            print_json(session)?;
            false
        }
        Commands::Stats => {
            print_json(&collection.statistics())?;
            false
        }
        Commands::Upcoming { days } => {
            print_json(&collection.upcoming_reviews(days.unwrap_or(config.upcoming_days)))?;
            false
        }
        Commands::Export { path } => {
            export_json_to_path(&collection.export_state(), &path)
                .with_context(|| format!("failed to export to {}", path.display()))?;
            println!("Exported collection to '{}'", path.display());
            false
        }
        Commands::Import { path } => {
            let snapshot = import_json(&path)
                .with_context(|| format!("failed to import {}", path.display()))?;
            collection.import_state(snapshot)?;
            println!("Imported collection from '{}'", path.display());
            true
        }
        Commands::Reset => {
            collection.reset();
            println!("Collection reset");
            true
        }
    };

    if mutated {
        db::save_snapshot(&collection.export_state(), &mut conn)
            .context("failed to save collection")?;
    }
    Ok(())
}
