use super::Quality;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One submitted review. Immutable once recorded in a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub card_id: String,
    pub quality: Quality,
    pub response_time_ms: u64,
    /// Caller's own verdict. Informational only: session counters use `quality`.
    pub correct: bool,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewResult {
    pub fn new(
        card_id: impl Into<String>,
        quality: Quality,
        response_time_ms: u64,
        correct: bool,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            quality,
            response_time_ms,
            correct,
            reviewed_at,
        }
    }
}
