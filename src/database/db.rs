//! SQLite persistence for collection snapshots
//!
//! Stores cards, study sessions and their review results in three tables.
//! A save replaces the table contents in a single transaction, so the
//! database always holds one complete snapshot.

use crate::error::StoreError;
use crate::models::{Card, CardContent, Quality, ReviewResult, Session, Snapshot};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::info;

/// Opens (or creates) the database file and makes sure the tables exist.
pub fn init_database(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let conn = Connection::open(path.as_ref())?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Creates the snapshot tables if they are missing.
pub fn create_tables(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            question TEXT NOT NULL DEFAULT '',
            answer TEXT NOT NULL DEFAULT '',
            tags TEXT NOT NULL DEFAULT '[]',
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetition INTEGER NOT NULL DEFAULT 0,
            last_reviewed TEXT,
            next_review TEXT NOT NULL,
            total_reviews INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            start_time TEXT NOT NULL,
            end_time TEXT,
            cards_reviewed INTEGER NOT NULL DEFAULT 0,
            cards_correct INTEGER NOT NULL DEFAULT 0,
            total_time_ms INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS review_results (
            session_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            card_id TEXT NOT NULL,
            quality INTEGER NOT NULL,
            response_time_ms INTEGER NOT NULL,
            correct INTEGER NOT NULL,
            reviewed_at TEXT NOT NULL,
            PRIMARY KEY (session_id, position),
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
        );",
    )?;
    Ok(())
}

/// Replaces everything stored with `snapshot`.
pub fn save_snapshot(snapshot: &Snapshot, conn: &mut Connection) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM review_results", ())?;
    tx.execute("DELETE FROM sessions", ())?;
    tx.execute("DELETE FROM cards", ())?;

    {
        let mut insert_card = tx.prepare(
            "INSERT INTO cards (id, question, answer, tags, ease_factor, interval_days, repetition,
                                last_reviewed, next_review, total_reviews, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for card in snapshot.cards.values() {
            insert_card.execute(params![
                card.id,
                card.content.question,
                card.content.answer,
                serde_json::to_string(&card.content.tags)?,
                card.ease_factor,
                card.interval,
                card.repetition,
                card.last_reviewed.map(|t| t.to_rfc3339()),
                card.next_review.to_rfc3339(),
                card.total_reviews,
                card.created_at.to_rfc3339(),
                card.updated_at.to_rfc3339(),
            ])?;
        }

        let mut insert_session = tx.prepare(
            "INSERT INTO sessions (id, start_time, end_time, cards_reviewed, cards_correct, total_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut insert_result = tx.prepare(
            "INSERT INTO review_results (session_id, position, card_id, quality, response_time_ms, correct, reviewed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for session in snapshot.sessions.values() {
            insert_session.execute(params![
                session.id,
                session.start_time.to_rfc3339(),
                session.end_time.map(|t| t.to_rfc3339()),
                session.cards_reviewed,
                session.cards_correct,
                session.total_time_ms as i64,
            ])?;

            for (position, result) in session.results.iter().enumerate() {
                insert_result.execute(params![
                    session.id,
                    position as i64,
                    result.card_id,
                    result.quality.value(),
                    result.response_time_ms as i64,
                    result.correct,
                    result.reviewed_at.to_rfc3339(),
                ])?;
            }
        }
    }

    tx.commit()?;
    info!(
        cards = snapshot.cards.len(),
        sessions = snapshot.sessions.len(),
        "snapshot saved to database"
    );
    Ok(())
}

struct CardRow {
    id: String,
    question: String,
    answer: String,
    tags: String,
    ease_factor: f64,
    interval: u32,
    repetition: u32,
    last_reviewed: Option<String>,
    next_review: String,
    total_reviews: u32,
    created_at: String,
    updated_at: String,
}

struct SessionRow {
    id: String,
    start_time: String,
    end_time: Option<String>,
    cards_reviewed: u32,
    cards_correct: u32,
    total_time_ms: i64,
}

struct ResultRow {
    session_id: String,
    card_id: String,
    quality: u8,
    response_time_ms: i64,
    correct: bool,
    reviewed_at: String,
}

/// Loads the stored snapshot. An empty database yields an empty snapshot.
pub fn load_snapshot(conn: &Connection) -> Result<Snapshot, StoreError> {
    let mut snapshot = Snapshot::default();

    let mut stmt = conn.prepare(
        "SELECT id, question, answer, tags, ease_factor, interval_days, repetition,
                last_reviewed, next_review, total_reviews, created_at, updated_at
         FROM cards",
    )?;
    let card_rows = stmt
        .query_map([], |row| {
            Ok(CardRow {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
                tags: row.get(3)?,
                ease_factor: row.get(4)?,
                interval: row.get(5)?,
                repetition: row.get(6)?,
                last_reviewed: row.get(7)?,
                next_review: row.get(8)?,
                total_reviews: row.get(9)?,
                created_at: row.get(10)?,
                updated_at: row.get(11)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for row in card_rows {
        let card = Card {
            content: CardContent {
                question: row.question,
                answer: row.answer,
                tags: serde_json::from_str(&row.tags)?,
            },
            ease_factor: row.ease_factor,
            interval: row.interval,
            repetition: row.repetition,
            last_reviewed: row.last_reviewed.as_deref().map(parse_timestamp).transpose()?,
            next_review: parse_timestamp(&row.next_review)?,
            total_reviews: row.total_reviews,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
        };
        snapshot.cards.insert(card.id.clone(), card);
    }

    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time, cards_reviewed, cards_correct, total_time_ms FROM sessions",
    )?;
    let session_rows = stmt
        .query_map([], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                start_time: row.get(1)?,
                end_time: row.get(2)?,
                cards_reviewed: row.get(3)?,
                cards_correct: row.get(4)?,
                total_time_ms: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for row in session_rows {
        let session = Session {
            start_time: parse_timestamp(&row.start_time)?,
            end_time: row.end_time.as_deref().map(parse_timestamp).transpose()?,
            cards_reviewed: row.cards_reviewed,
            cards_correct: row.cards_correct,
            total_time_ms: row.total_time_ms.max(0) as u64,
            results: Vec::new(),
            id: row.id,
        };
        snapshot.sessions.insert(session.id.clone(), session);
    }

    let mut stmt = conn.prepare(
        "SELECT session_id, card_id, quality, response_time_ms, correct, reviewed_at
         FROM review_results
         ORDER BY session_id, position",
    )?;
    let result_rows = stmt
        .query_map([], |row| {
            Ok(ResultRow {
                session_id: row.get(0)?,
                card_id: row.get(1)?,
                quality: row.get(2)?,
                response_time_ms: row.get(3)?,
                correct: row.get(4)?,
                reviewed_at: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for row in result_rows {
        let result = ReviewResult {
            card_id: row.card_id,
            quality: Quality::new(row.quality)?,
            response_time_ms: row.response_time_ms.max(0) as u64,
            correct: row.correct,
            reviewed_at: parse_timestamp(&row.reviewed_at)?,
        };
        if let Some(session) = snapshot.sessions.get_mut(&row.session_id) {
            session.results.push(result);
        }
    }

    snapshot.validate()?;
    info!(
        cards = snapshot.cards.len(),
        sessions = snapshot.sessions.len(),
        "snapshot loaded from database"
    );
    Ok(snapshot)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp {
            value: value.to_string(),
            source,
        })
}
