pub mod collection;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use collection::{Collection, ReviewOutcome, SharedCollection};
pub use error::{ErrorKind, SchedulerError, StoreError};
pub use models::{Card, Quality, ReviewResult, Session, Snapshot};
