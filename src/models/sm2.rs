//! SM-2 (SuperMemo 2) spaced repetition algorithm implementation.
//!
//! The SM-2 algorithm calculates optimal review intervals based on recall quality:
//! - Each card has an easiness factor (EF) that adjusts based on performance
//! - Quality grades 0-2: Reset interval and repetitions (card needs relearning)
//! - Quality grades 3-5: Increase interval progressively (1 day → 6 days → EF multiplier)
//! - EF stays within [1.3, 5.0] and is stored rounded to 2 decimals
//!
//! Every function here is pure: the current time is always passed in.

use super::{Card, CardContent, IntervalHistogram, Quality, Stats};
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MAX_EASE_FACTOR: f64 = 5.0;
/// EF penalty applied on a failed review.
pub const FAILURE_PENALTY: f64 = 0.2;
/// Upper bound on scheduled intervals (100 years) so due dates stay representable.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Returns a never-reviewed card that is due immediately.
pub fn create_default(id: impl Into<String>, now: DateTime<Utc>) -> Card {
    Card {
        id: id.into(),
        content: CardContent::default(),
        ease_factor: DEFAULT_EASE_FACTOR,
        interval: 1,
        repetition: 0,
        last_reviewed: None,
        next_review: now,
        total_reviews: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Calculates the card state after a review of the given quality at `now`.
///
/// Intervals from the third success on are `round(interval × EF)`, rounding
/// half away from zero, using the EF held before this review. Intervals are
/// capped at [`MAX_INTERVAL_DAYS`]; counters saturate instead of overflowing.
pub fn next_state(card: &Card, quality: Quality, now: DateTime<Utc>) -> Card {
    let q = f64::from(quality.value());

    let (ease_factor, interval, repetition) = if quality.is_correct() {
        let interval = match card.repetition {
            0 => 1,
            1 => 6,
            _ => (f64::from(card.interval) * card.ease_factor).round() as u32,
        };
        let ease = card.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
        (ease, interval, card.repetition.saturating_add(1))
    } else {
        // Failed recall: start over
        let ease = (card.ease_factor - FAILURE_PENALTY).max(MIN_EASE_FACTOR);
        (ease, 1, 0)
    };

    let ease_factor = round_ease(ease_factor.clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR));
    let interval = interval.clamp(1, MAX_INTERVAL_DAYS);

    Card {
        ease_factor,
        interval,
        repetition,
        last_reviewed: Some(now),
        next_review: now + Duration::days(i64::from(interval)),
        total_reviews: card.total_reviews.saturating_add(1),
        updated_at: now,
        ..card.clone()
    }
}

/// Rounds an ease factor to 2 decimals for storage.
pub fn round_ease(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    card.next_review <= now
}

pub fn filter_due<'a>(cards: impl IntoIterator<Item = &'a Card>, now: DateTime<Utc>) -> Vec<Card> {
    cards
        .into_iter()
        .filter(|card| is_due(card, now))
        .cloned()
        .collect()
}

/// Due cards, most overdue first. Equally overdue cards are ordered by
/// ascending ease factor so harder cards come first.
pub fn study_order<'a>(cards: impl IntoIterator<Item = &'a Card>, now: DateTime<Utc>) -> Vec<Card> {
    let mut due = filter_due(cards, now);
    // Overdue-ness descending is next_review ascending
    due.sort_by(|a, b| {
        a.next_review
            .cmp(&b.next_review)
            .then_with(|| a.ease_factor.total_cmp(&b.ease_factor))
    });
    due
}

pub fn stats<'a>(cards: impl IntoIterator<Item = &'a Card>, now: DateTime<Utc>) -> Stats {
    let today = now.date_naive();
    let mut total_cards = 0;
    let mut due_today = 0;
    let mut ease_sum = 0.0;
    let mut interval_histogram = IntervalHistogram::default();

    for card in cards {
        total_cards += 1;
        ease_sum += card.ease_factor;
        if card.next_review.date_naive() <= today {
            due_today += 1;
        }
        interval_histogram.add(card.interval);
    }

    let average_ease_factor = if total_cards == 0 {
        DEFAULT_EASE_FACTOR
    } else {
        round_ease(ease_sum / total_cards as f64)
    };

    Stats {
        total_cards,
        due_today,
        average_ease_factor,
        interval_histogram,
    }
}
