//! Card collection and study session management.
//!
//! [`Collection`] owns every card and session. All scheduling changes go
//! through the SM-2 engine in [`crate::models::sm2`]; the collection only
//! validates ids, sequences updates and folds statistics.

pub mod clock;
pub mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use shared::SharedCollection;

use crate::error::SchedulerError;
use crate::models::{
    AggregateStats, Card, CardContent, CardHistory, ReviewResult, Session, Snapshot, sm2,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// What a submitted review produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub card: Card,
    pub session: Session,
    pub next_interval: u32,
    pub ease_factor_change: f64,
    pub message: String,
}

pub struct Collection {
    cards: HashMap<String, Card>,
    sessions: HashMap<String, Session>,
    clock: Box<dyn Clock>,
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Collection {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            cards: HashMap::new(),
            sessions: HashMap::new(),
            clock: Box::new(clock),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a default card. Ids are never overwritten.
    pub fn add_card(&mut self, id: impl Into<String>) -> Result<Card> {
        self.add_card_with_content(id, CardContent::default())
    }

    pub fn add_card_with_content(
        &mut self,
        id: impl Into<String>,
        content: CardContent,
    ) -> Result<Card> {
        let id = id.into();
        if self.cards.contains_key(&id) {
            return Err(SchedulerError::DuplicateId(id));
        }

        let card = Card {
            content,
            ..sm2::create_default(id.clone(), self.now())
        };
        self.cards.insert(id, card.clone());
        debug!(card_id = %card.id, "card added");
        Ok(card)
    }

    pub fn get_card(&self, id: &str) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn all_cards(&self) -> Vec<Card> {
        self.cards.values().cloned().collect()
    }

    pub fn due_cards(&self) -> Vec<Card> {
        sm2::filter_due(self.cards.values(), self.now())
    }

    /// Due cards in the order they should be studied.
    pub fn study_queue(&self) -> Vec<Card> {
        sm2::study_order(self.cards.values(), self.now())
    }

    /// Replaces a card's content. Scheduling state is left alone.
    pub fn update_content(&mut self, id: &str, content: CardContent) -> Result<Card> {
        let existing = self
            .cards
            .get(id)
            .ok_or_else(|| SchedulerError::CardNotFound(id.to_string()))?;

        let updated = Card {
            content,
            updated_at: self.now(),
            ..existing.clone()
        };
        self.cards.insert(id.to_string(), updated.clone());
        debug!(card_id = %id, "card content updated");
        Ok(updated)
    }

    pub fn remove_card(&mut self, id: &str) -> Result<Card> {
        let card = self
            .cards
            .remove(id)
            .ok_or_else(|| SchedulerError::CardNotFound(id.to_string()))?;
        debug!(card_id = %id, "card removed");
        Ok(card)
    }

    pub fn card_history(&self, id: &str) -> Result<CardHistory> {
        self.cards
            .get(id)
            .map(CardHistory::from)
            .ok_or_else(|| SchedulerError::CardNotFound(id.to_string()))
    }

    pub fn start_session(&mut self) -> Session {
        let mut id = Uuid::new_v4().to_string();
        while self.sessions.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let session = Session::new(id.clone(), self.now());
        self.sessions.insert(id, session.clone());
        debug!(session_id = %session.id, "session started");
        session
    }

    pub fn get_session(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    /// Applies a review to its card and records it in an open session.
    ///
    /// The transition is timed with the collection clock; `result.reviewed_at`
    /// is stored as given. Nothing changes unless both ids resolve.
    pub fn submit_review(&mut self, session_id: &str, result: ReviewResult) -> Result<ReviewOutcome> {
        let session = self.open_session(session_id)?;
        let card = self
            .cards
            .get(&result.card_id)
            .ok_or_else(|| SchedulerError::CardNotFound(result.card_id.clone()))?;

        let updated = sm2::next_state(card, result.quality, self.now());
        let ease_factor_change = sm2::round_ease(updated.ease_factor - card.ease_factor);
        let message = feedback_message(result.quality.value(), updated.interval);

        let mut session = session.clone();
        let quality = result.quality;
        session.record(result);

        self.cards.insert(updated.id.clone(), updated.clone());
        self.sessions.insert(session.id.clone(), session.clone());
        debug!(
            session_id = %session.id,
            card_id = %updated.id,
            quality = %quality,
            interval = updated.interval,
            ease_factor = updated.ease_factor,
            "review applied"
        );

        Ok(ReviewOutcome {
            next_interval: updated.interval,
            card: updated,
            session,
            ease_factor_change,
            message,
        })
    }

    pub fn end_session(&mut self, session_id: &str) -> Result<Session> {
        let mut session = self.open_session(session_id)?.clone();
        session.close(self.now());
        self.sessions.insert(session.id.clone(), session.clone());
        debug!(
            session_id = %session.id,
            total_time_ms = session.total_time_ms,
            "session ended"
        );
        Ok(session)
    }

    fn open_session(&self, session_id: &str) -> Result<&Session> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| SchedulerError::SessionNotFound(session_id.to_string()))?;
        if !session.is_open() {
            return Err(SchedulerError::SessionClosed(session_id.to_string()));
        }
        Ok(session)
    }

    pub fn statistics(&self) -> AggregateStats {
        let cards = sm2::stats(self.cards.values(), self.now());
        let total_reviews_completed = self
            .cards
            .values()
            .map(|card| u64::from(card.total_reviews))
            .sum();

        let mut sessions_completed = 0usize;
        let mut total_study_time_ms = 0u64;
        let mut reviewed = 0u64;
        let mut correct = 0u64;
        for session in self.sessions.values().filter(|s| !s.is_open()) {
            sessions_completed += 1;
            total_study_time_ms = total_study_time_ms.saturating_add(session.total_time_ms);
            reviewed += u64::from(session.cards_reviewed);
            correct += u64::from(session.cards_correct);
        }

        let accuracy = if reviewed == 0 {
            0.0
        } else {
            let percent = correct as f64 / reviewed as f64 * 100.0;
            (percent * 100.0).round() / 100.0
        };
        let average_session_length_ms = if sessions_completed == 0 {
            0
        } else {
            total_study_time_ms / sessions_completed as u64
        };

        AggregateStats {
            cards,
            total_reviews_completed,
            accuracy,
            sessions_completed,
            total_study_time_ms,
            average_session_length_ms,
        }
    }

    /// Cards per calendar day for `days` days starting today. Days without
    /// reviews are present with a zero count; overdue cards are not counted.
    /// The window never exceeds [`sm2::MAX_INTERVAL_DAYS`], the furthest any
    /// card can be scheduled.
    pub fn upcoming_reviews(&self, days: u32) -> BTreeMap<NaiveDate, usize> {
        let days = days.min(sm2::MAX_INTERVAL_DAYS);
        let today = self.now().date_naive();
        let mut upcoming: BTreeMap<NaiveDate, usize> = (0..days)
            .filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
            .map(|date| (date, 0))
            .collect();

        for card in self.cards.values() {
            if let Some(count) = upcoming.get_mut(&card.next_review.date_naive()) {
                *count += 1;
            }
        }
        upcoming
    }

    pub fn export_state(&self) -> Snapshot {
        Snapshot {
            cards: self
                .cards
                .iter()
                .map(|(id, card)| (id.clone(), card.clone()))
                .collect(),
            sessions: self
                .sessions
                .iter()
                .map(|(id, session)| (id.clone(), session.clone()))
                .collect(),
        }
    }

    /// Replaces the whole state with `snapshot`. An invalid snapshot is
    /// rejected and the current state kept.
    pub fn import_state(&mut self, snapshot: Snapshot) -> Result<()> {
        snapshot.validate()?;
        self.cards = snapshot.cards.into_iter().collect();
        self.sessions = snapshot.sessions.into_iter().collect();
        debug!(
            cards = self.cards.len(),
            sessions = self.sessions.len(),
            "state imported"
        );
        Ok(())
    }

    pub fn reset(&mut self) {
        self.cards.clear();
        self.sessions.clear();
        debug!("collection reset");
    }
}

fn feedback_message(quality: u8, interval: u32) -> String {
    match quality {
        4..=5 => format!("Great! Next review in {interval} days."),
        3 => format!("Good. Next review in {interval} days."),
        _ => "Keep practicing. You'll see this card again tomorrow.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::Quality;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn collection() -> (Collection, ManualClock) {
        let clock = ManualClock::new(start());
        (Collection::with_clock(clock.clone()), clock)
    }

    fn review(card_id: &str, quality: u8) -> ReviewResult {
        ReviewResult::new(card_id, Quality::new(quality).unwrap(), 2000, quality >= 3, start())
    }

    #[test]
    fn test_add_card_uses_defaults() {
        let (mut collection, _) = collection();
        let card = collection.add_card("hola").unwrap();

        assert_eq!(card.ease_factor, 2.5);
        assert_eq!(card.next_review, start());
        assert_eq!(collection.get_card("hola"), Some(&card));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (mut collection, _) = collection();
        collection
            .add_card_with_content(
                "hola",
                CardContent {
                    question: "hola".to_string(),
                    answer: "hello".to_string(),
                    tags: vec!["spanish".to_string()],
                },
            )
            .unwrap();

        let err = collection.add_card("hola").unwrap_err();
        assert_eq!(err, SchedulerError::DuplicateId("hola".to_string()));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        // The existing card is untouched
        assert_eq!(collection.get_card("hola").unwrap().content.answer, "hello");
    }

    #[test]
    fn test_due_cards_follow_clock() {
        let (mut collection, clock) = collection();
        collection.add_card("a").unwrap();
        let session = collection.start_session();
        collection.submit_review(&session.id, review("a", 5)).unwrap();

        assert!(collection.due_cards().is_empty());
        clock.advance_days(1);
        assert_eq!(collection.due_cards().len(), 1);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let (mut collection, _) = collection();
        let a = collection.start_session();
        let b = collection.start_session();
        assert_ne!(a.id, b.id);
        assert_eq!(collection.sessions().len(), 2);
    }

    #[test]
    fn test_session_accounting() {
        let (mut collection, _) = collection();
        for id in ["a", "b", "c"] {
            collection.add_card(id).unwrap();
        }
        let session = collection.start_session();

        collection.submit_review(&session.id, review("a", 4)).unwrap();
        collection.submit_review(&session.id, review("b", 1)).unwrap();
        let outcome = collection.submit_review(&session.id, review("c", 5)).unwrap();

        assert_eq!(outcome.session.cards_reviewed, 3);
        assert_eq!(outcome.session.cards_correct, 2);
        let ids: Vec<_> = outcome
            .session
            .results
            .iter()
            .map(|r| r.card_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(collection.get_session(&session.id), Some(&outcome.session));
    }

    #[test]
    fn test_correct_counter_ignores_caller_flag() {
        let (mut collection, _) = collection();
        collection.add_card("a").unwrap();
        let session = collection.start_session();

        let mut result = review("a", 1);
        result.correct = true;
        let outcome = collection.submit_review(&session.id, result).unwrap();
        assert_eq!(outcome.session.cards_correct, 0);
    }

    #[test]
    fn test_review_outcome_feedback() {
        let (mut collection, _) = collection();
        collection.add_card("a").unwrap();
        let session = collection.start_session();

        let outcome = collection.submit_review(&session.id, review("a", 5)).unwrap();
        assert_eq!(outcome.next_interval, 1);
        assert_eq!(outcome.ease_factor_change, 0.1);
        assert_eq!(outcome.message, "Great! Next review in 1 days.");
        assert_eq!(outcome.card.total_reviews, 1);

        let outcome = collection.submit_review(&session.id, review("a", 0)).unwrap();
        assert_eq!(outcome.ease_factor_change, -0.2);
        assert!(outcome.message.starts_with("Keep practicing"));
    }

    #[test]
    fn test_review_unknown_ids_leave_state_unchanged() {
        let (mut collection, _) = collection();
        collection.add_card("a").unwrap();
        let session = collection.start_session();

        let err = collection.submit_review("missing", review("a", 4)).unwrap_err();
        assert_eq!(err, SchedulerError::SessionNotFound("missing".to_string()));

        let err = collection
            .submit_review(&session.id, review("ghost", 4))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(collection.get_card("a").unwrap().total_reviews, 0);
        assert_eq!(collection.get_session(&session.id).unwrap().cards_reviewed, 0);
    }

    #[test]
    fn test_closed_session_rejects_reviews() {
        let (mut collection, clock) = collection();
        collection.add_card("a").unwrap();
        let session = collection.start_session();
        clock.advance(Duration::minutes(10));

        let closed = collection.end_session(&session.id).unwrap();
        assert_eq!(closed.end_time, Some(start() + Duration::minutes(10)));
        assert_eq!(closed.total_time_ms, 600_000);

        let err = collection.submit_review(&session.id, review("a", 4)).unwrap_err();
        assert_eq!(err, SchedulerError::SessionClosed(session.id.clone()));
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        let err = collection.end_session(&session.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(collection.get_card("a").unwrap().total_reviews, 0);
    }

    #[test]
    fn test_update_and_remove_card() {
        let (mut collection, clock) = collection();
        collection.add_card("a").unwrap();
        clock.advance(Duration::hours(1));

        let updated = collection
            .update_content(
                "a",
                CardContent {
                    question: "dziękuję".to_string(),
                    answer: "thank you".to_string(),
                    tags: Vec::new(),
                },
            )
            .unwrap();
        assert_eq!(updated.updated_at, start() + Duration::hours(1));
        assert_eq!(updated.created_at, start());
        assert_eq!(updated.interval, 1);

        let removed = collection.remove_card("a").unwrap();
        assert_eq!(removed.content.answer, "thank you");
        assert!(collection.get_card("a").is_none());
        assert_eq!(
            collection.remove_card("a").unwrap_err(),
            SchedulerError::CardNotFound("a".to_string())
        );
    }

    #[test]
    fn test_card_history() {
        let (mut collection, _) = collection();
        collection.add_card("a").unwrap();
        let session = collection.start_session();
        collection.submit_review(&session.id, review("a", 4)).unwrap();

        let history = collection.card_history("a").unwrap();
        assert_eq!(history.total_reviews, 1);
        assert_eq!(history.last_reviewed, Some(start()));
        assert!(collection.card_history("b").is_err());
    }

    #[test]
    fn test_statistics() {
        let (mut collection, clock) = collection();
        for id in ["a", "b"] {
            collection.add_card(id).unwrap();
        }

        let empty = collection.statistics();
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.sessions_completed, 0);
        assert_eq!(empty.average_session_length_ms, 0);

        let first = collection.start_session();
        collection.submit_review(&first.id, review("a", 4)).unwrap();
        collection.submit_review(&first.id, review("b", 2)).unwrap();
        clock.advance(Duration::minutes(4));
        collection.end_session(&first.id).unwrap();

        let second = collection.start_session();
        collection.submit_review(&second.id, review("a", 5)).unwrap();
        clock.advance(Duration::minutes(2));
        collection.end_session(&second.id).unwrap();

        // Open sessions are excluded from session aggregates
        let open = collection.start_session();
        collection.submit_review(&open.id, review("b", 0)).unwrap();

        let stats = collection.statistics();
        assert_eq!(stats.cards.total_cards, 2);
        assert_eq!(stats.total_reviews_completed, 4);
        assert_eq!(stats.sessions_completed, 2);
        assert_eq!(stats.total_study_time_ms, 360_000);
        assert_eq!(stats.average_session_length_ms, 180_000);
        assert_eq!(stats.accuracy, 66.67);
    }

    #[test]
    fn test_upcoming_reviews() {
        let (mut collection, _) = collection();
        for id in ["a", "b", "c", "d"] {
            collection.add_card(id).unwrap();
        }
        let session = collection.start_session();
        // a, b -> tomorrow; c stays due today
        collection.submit_review(&session.id, review("a", 4)).unwrap();
        collection.submit_review(&session.id, review("b", 1)).unwrap();
        // d -> six days out
        collection.submit_review(&session.id, review("d", 4)).unwrap();
        collection.submit_review(&session.id, review("d", 4)).unwrap();

        let upcoming = collection.upcoming_reviews(7);
        let today = start().date_naive();
        assert_eq!(upcoming.len(), 7);
        assert_eq!(upcoming[&today], 1);
        assert_eq!(upcoming[&(today + Duration::days(1))], 2);
        assert_eq!(upcoming[&(today + Duration::days(2))], 0);
        assert_eq!(upcoming[&(today + Duration::days(6))], 1);
        assert!(collection.upcoming_reviews(0).is_empty());
    }

    #[test]
    fn test_upcoming_reviews_window_is_capped() {
        let (mut collection, _) = collection();
        collection.add_card("a").unwrap();

        let upcoming = collection.upcoming_reviews(u32::MAX);
        let today = start().date_naive();
        assert_eq!(upcoming.len(), sm2::MAX_INTERVAL_DAYS as usize);
        assert_eq!(upcoming[&today], 1);
        let last = today + Duration::days(i64::from(sm2::MAX_INTERVAL_DAYS) - 1);
        assert_eq!(upcoming.keys().next_back(), Some(&last));
    }

    #[test]
    fn test_export_import_round_trip() {
        let (mut source, clock) = collection();
        for id in ["a", "b", "c"] {
            source.add_card(id).unwrap();
        }
        let session = source.start_session();
        source.submit_review(&session.id, review("a", 4)).unwrap();
        source.submit_review(&session.id, review("b", 0)).unwrap();
        source.end_session(&session.id).unwrap();

        let mut target = Collection::with_clock(clock.clone());
        target.import_state(source.export_state()).unwrap();

        assert_eq!(target.export_state(), source.export_state());
        assert_eq!(target.statistics(), source.statistics());
        let mut ids: Vec<_> = target.all_cards().into_iter().map(|c| c.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_import_replaces_existing_state() {
        let (mut collection, _) = collection();
        collection.add_card("old").unwrap();

        let mut snapshot = Snapshot::default();
        let card = sm2::create_default("new", start());
        snapshot.cards.insert(card.id.clone(), card);
        collection.import_state(snapshot).unwrap();

        assert!(collection.get_card("old").is_none());
        assert!(collection.get_card("new").is_some());
    }

    #[test]
    fn test_invalid_import_keeps_state() {
        let (mut collection, _) = collection();
        collection.add_card("keep").unwrap();

        let mut snapshot = Snapshot::default();
        let mut card = sm2::create_default("bad", start());
        card.ease_factor = 9.0;
        snapshot.cards.insert(card.id.clone(), card);

        assert!(collection.import_state(snapshot).is_err());
        assert!(collection.get_card("keep").is_some());
        assert!(collection.get_card("bad").is_none());
    }

    #[test]
    fn test_review_after_import_with_maxed_counters() {
        let (mut collection, _) = collection();
        let mut snapshot = Snapshot::default();
        let mut card = sm2::create_default("worn", start());
        card.repetition = u32::MAX;
        card.total_reviews = u32::MAX;
        card.interval = 30;
        snapshot.cards.insert(card.id.clone(), card);
        let mut session = Session::new("s1", start());
        session.cards_reviewed = u32::MAX;
        session.cards_correct = u32::MAX;
        snapshot.sessions.insert(session.id.clone(), session);
        collection.import_state(snapshot).unwrap();

        let outcome = collection.submit_review("s1", review("worn", 4)).unwrap();
        assert_eq!(outcome.card.repetition, u32::MAX);
        assert_eq!(outcome.card.total_reviews, u32::MAX);
        assert_eq!(outcome.session.cards_reviewed, u32::MAX);
        assert_eq!(outcome.session.cards_correct, u32::MAX);
        assert_eq!(collection.statistics().total_reviews_completed, u64::from(u32::MAX));
    }

    #[test]
    fn test_reset() {
        let (mut collection, _) = collection();
        collection.add_card("a").unwrap();
        collection.start_session();
        collection.reset();

        assert!(collection.all_cards().is_empty());
        assert!(collection.sessions().is_empty());
        assert!(collection.export_state().is_empty());
    }
}
