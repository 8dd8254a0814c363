//! Thread-safe handle to a [`Collection`].
//!
//! Mutations run under the write lock one at a time; reads share the read
//! lock and hand back owned snapshots, never references into the maps.

use super::{Collection, ReviewOutcome, Result};
use crate::models::{AggregateStats, Card, ReviewResult, Session};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Clone)]
pub struct SharedCollection {
    inner: Arc<RwLock<Collection>>,
}

impl SharedCollection {
    pub fn new(collection: Collection) -> Self {
        Self {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Runs `f` with shared access.
    pub fn read<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Runs `f` with exclusive access.
    pub fn write<R>(&self, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    pub fn add_card(&self, id: impl Into<String>) -> Result<Card> {
        self.write(|collection| collection.add_card(id))
    }

    pub fn get_card(&self, id: &str) -> Option<Card> {
        self.read(|collection| collection.get_card(id).cloned())
    }

    pub fn due_cards(&self) -> Vec<Card> {
        self.read(Collection::due_cards)
    }

    pub fn start_session(&self) -> Session {
        self.write(Collection::start_session)
    }

    pub fn submit_review(&self, session_id: &str, result: ReviewResult) -> Result<ReviewOutcome> {
        self.write(|collection| collection.submit_review(session_id, result))
    }

    pub fn end_session(&self, session_id: &str) -> Result<Session> {
        self.write(|collection| collection.end_session(session_id))
    }

    pub fn statistics(&self) -> AggregateStats {
        self.read(Collection::statistics)
    }
}
