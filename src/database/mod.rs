pub mod db;

pub use db::{create_tables, init_database, load_snapshot, save_snapshot};
