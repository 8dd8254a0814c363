//! Study session bookkeeping.
//! A session collects review results between its start and end and keeps running counters.

use super::ReviewResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bounded study interaction. Open until `end_time` is set, immutable afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub cards_reviewed: u32,
    pub cards_correct: u32,
    /// Milliseconds between start and end. Zero while the session is open.
    pub total_time_ms: u64,
    /// Results in submission order.
    #[serde(default)]
    pub results: Vec<ReviewResult>,
}

impl Session {
    pub fn new(id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time: None,
            cards_reviewed: 0,
            cards_correct: 0,
            total_time_ms: 0,
            results: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Appends a result and bumps the counters. Correctness comes from the quality grade.
    pub(crate) fn record(&mut self, result: ReviewResult) {
        self.cards_reviewed = self.cards_reviewed.saturating_add(1);
        if result.quality.is_correct() {
            self.cards_correct = self.cards_correct.saturating_add(1);
        }
        self.results.push(result);
    }

    /// Sets the end time and computes the total duration. A clock that went
    /// backwards yields a zero duration.
    pub(crate) fn close(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.start_time).num_milliseconds().max(0);
        self.end_time = Some(now);
        self.total_time_ms = elapsed as u64;
    }
}
