use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Challenge, ChallengeId};
use crate::profile::UserProfile;

/// Maximum number of completions remembered per user.
pub const HISTORY_CAPACITY: usize = 5;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Recency log of challenge id -> last completion date.
///
/// Serialized as a JSON object keyed by the stringified id, e.g.
/// `{"3":"2026-10-19"}`. Never holds more than `HISTORY_CAPACITY` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionHistory {
    entries: BTreeMap<ChallengeId, NaiveDate>,
}

impl CompletionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Date the challenge was last completed, if it is still remembered.
    pub fn completed_on(&self, id: ChallengeId) -> Option<NaiveDate> {
        self.entries.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChallengeId, NaiveDate)> + '_ {
        self.entries.iter().map(|(id, date)| (*id, *date))
    }

    /// Insert `id` completed on `today`, evicting the oldest completion first
    /// when the log is already full. Re-recording an id only moves its date.
    pub fn record(&mut self, id: ChallengeId, today: NaiveDate) {
        if self.entries.len() >= HISTORY_CAPACITY {
            self.evict_oldest();
        }
        self.entries.insert(id, today);
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, date)| **date)
            .map(|(id, _)| *id);

        if let Some(id) = oldest {
            self.entries.remove(&id);
        }
    }

    /// Parse the JSON cell stored on a user row.
    ///
    /// Anything unreadable degrades to an empty history: a malformed blob,
    /// non-numeric ids and unparseable dates are dropped with a warning.
    /// Oversized legacy logs are pruned back to capacity.
    pub fn from_json_lenient(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::default();
        }

        let map: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(raw) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(other) => {
                warn!("last_completions is not a JSON object ({}), using empty history", other);
                return Self::default();
            }
            Err(e) => {
                warn!("Malformed last_completions JSON: {}", e);
                return Self::default();
            }
        };

        let mut entries = BTreeMap::new();
        for (key, value) in map {
            let id = key
                .trim()
                .trim_end_matches(".0")
                .parse::<ChallengeId>()
                .ok();
            let date = value
                .as_str()
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok());

            match (id, date) {
                (Some(id), Some(date)) => {
                    entries.insert(id, date);
                }
                _ => warn!("Dropping unreadable history entry {:?} -> {}", key, value),
            }
        }

        let mut history = Self { entries };
        while history.entries.len() > HISTORY_CAPACITY {
            history.evict_oldest();
        }
        history
    }

    pub fn to_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|(id, date)| {
                (
                    id.to_string(),
                    serde_json::Value::String(date.format(DATE_FORMAT).to_string()),
                )
            })
            .collect();
        serde_json::Value::Object(map).to_string()
    }
}

/// Record a completion on the user: history insertion plus the difficulty
/// counter for the challenge.
///
/// The counter lookup goes through the catalog; if the id is not there the
/// counter is left alone and only the history changes.
pub fn record_completion<'a>(
    user: &'a mut UserProfile,
    challenge_id: ChallengeId,
    today: NaiveDate,
    catalog: &[Challenge],
) -> &'a CompletionHistory {
    user.history.record(challenge_id, today);

    match Challenge::find(catalog, challenge_id) {
        Some(challenge) => user.bump_counter(challenge.difficulty),
        None => warn!(
            "Challenge {} not in catalog, completion counter for {} not incremented",
            challenge_id, user.name
        ),
    }

    &user.history
}
