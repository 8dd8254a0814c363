//! Statistics over a card population and its study sessions.
use serde::{Deserialize, Serialize};

/// Card counts per interval bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalHistogram {
    pub one_day: usize,
    pub two_to_six_days: usize,
    pub one_to_four_weeks: usize,
    pub over_four_weeks: usize,
}

impl IntervalHistogram {
    pub fn add(&mut self, interval: u32) {
        match interval {
            0..=1 => self.one_day += 1,
            2..=6 => self.two_to_six_days += 1,
            7..=28 => self.one_to_four_weeks += 1,
            _ => self.over_four_weeks += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.one_day + self.two_to_six_days + self.one_to_four_weeks + self.over_four_weeks
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_cards: usize,
    /// Cards due by the end of the current UTC day.
    pub due_today: usize,
    /// 2.5 for an empty collection.
    pub average_ease_factor: f64,
    pub interval_histogram: IntervalHistogram,
}

/// Card statistics combined with aggregates over closed sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    #[serde(flatten)]
    pub cards: Stats,
    /// Sum of `total_reviews` across all cards.
    pub total_reviews_completed: u64,
    /// Percentage of correct reviews in closed sessions.
    pub accuracy: f64,
    pub sessions_completed: usize,
    pub total_study_time_ms: u64,
    pub average_session_length_ms: u64,
}
