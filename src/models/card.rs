//! A card is one learning item together with its SM-2 memory state.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the learner sees. Scheduling never reads it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CardContent {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    #[serde(flatten)]
    pub content: CardContent,
    /// Always within `[MIN_EASE_FACTOR, MAX_EASE_FACTOR]`, stored at 2 decimals.
    pub ease_factor: f64,
    /// Days until the next review, at least 1.
    pub interval: u32,
    /// Consecutive successful reviews since the last failure.
    pub repetition: u32,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: DateTime<Utc>,
    pub total_reviews: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Review history summary for a single card.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CardHistory {
    pub card_id: String,
    pub total_reviews: u32,
    pub current_interval: u32,
    pub ease_factor: f64,
    pub repetition: u32,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Card> for CardHistory {
    fn from(card: &Card) -> Self {
        Self {
            card_id: card.id.clone(),
            total_reviews: card.total_reviews,
            current_interval: card.interval,
            ease_factor: card.ease_factor,
            repetition: card.repetition,
            last_reviewed: card.last_reviewed,
            next_review: card.next_review,
            created_at: card.created_at,
        }
    }
}
