//! Full collection state in its transport shape: card id → card, session id → session.
use super::{Card, Session};
use super::sm2::{MAX_EASE_FACTOR, MIN_EASE_FACTOR};
use crate::error::SchedulerError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub cards: BTreeMap<String, Card>,
    #[serde(default)]
    pub sessions: BTreeMap<String, Session>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty() && self.sessions.is_empty()
    }

    /// Checks that every record matches its key and holds a reachable state.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        for (key, card) in &self.cards {
            if key != &card.id {
                return Err(invalid(format!("card key {key:?} holds card {:?}", card.id)));
            }
            if !(MIN_EASE_FACTOR..=MAX_EASE_FACTOR).contains(&card.ease_factor) {
                return Err(invalid(format!(
                    "card {key:?} has ease factor {} outside [{MIN_EASE_FACTOR}, {MAX_EASE_FACTOR}]",
                    card.ease_factor
                )));
            }
            if card.interval == 0 {
                return Err(invalid(format!("card {key:?} has a zero interval")));
            }
        }

        for (key, session) in &self.sessions {
            if key != &session.id {
                return Err(invalid(format!(
                    "session key {key:?} holds session {:?}",
                    session.id
                )));
            }
            if session.cards_correct > session.cards_reviewed {
                return Err(invalid(format!(
                    "session {key:?} has more correct than reviewed cards"
                )));
            }
        }

        Ok(())
    }
}

fn invalid(reason: String) -> SchedulerError {
    SchedulerError::InvalidSnapshot(reason)
}
