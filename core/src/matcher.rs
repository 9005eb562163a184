// Point-query matching
//
// Pure predicates over the active reference. Exact-id and name-fallback
// matching are mutually exclusive per query: a reference carrying an id
// never falls through to the name check on a miss.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::{EntityKind, HighlightReference};

/// Matching tolerances and highlight lifetime.
///
/// The time-correlation windows are a best-effort heuristic: when an event
/// names a parent test but not the freshly created result row, the row is
/// found by timestamp proximity, and two rows recorded inside the same
/// candidate window can match ambiguously. Deployments can override the
/// windows instead of patching constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Window around the event time used to select a candidate row (ms)
    pub candidate_window_ms: i64,
    /// Window around the selected candidate used to confirm the queried row (ms)
    pub confirm_window_ms: i64,
    /// Highlight lifetime before auto-expiry (ms)
    pub expiry_ms: u64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            candidate_window_ms: 60_000,
            confirm_window_ms: 1_000,
            expiry_ms: 10_000,
        }
    }
}

impl MatchPolicy {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            candidate_window_ms: env_parse("SPOTLIGHT_CANDIDATE_WINDOW_MS")
                .unwrap_or(defaults.candidate_window_ms),
            confirm_window_ms: env_parse("SPOTLIGHT_CONFIRM_WINDOW_MS")
                .unwrap_or(defaults.confirm_window_ms),
            expiry_ms: env_parse("SPOTLIGHT_EXPIRY_MS").unwrap_or(defaults.expiry_ms),
        }
    }

    pub fn expiry(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.expiry_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// A consumer-supplied list row eligible for time correlation. Rows without
/// a recorded time are never selected as candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, recorded_at: Option<DateTime<Utc>>) -> Self {
        Self {
            id: id.into(),
            recorded_at,
        }
    }
}

impl HighlightReference {
    /// Should the given list item be emphasized?
    ///
    /// Kind mismatch rejects outright. With an id on the reference the item
    /// id must match exactly (case-sensitive). Without one, the reference's
    /// display name and the item's name match case-insensitively when
    /// either contains the other, which keeps partial manual lookups
    /// working in both directions.
    pub fn matches(
        &self,
        item_id: &str,
        item_kind: Option<EntityKind>,
        item_name: Option<&str>,
    ) -> bool {
        if let Some(kind) = item_kind {
            if kind != self.kind {
                return false;
            }
        }
        match self.entity_id.as_deref() {
            Some(id) if !id.is_empty() => id == item_id,
            _ => match (self.display_name.as_deref(), item_name) {
                (Some(name), Some(item_name)) if !name.is_empty() && !item_name.is_empty() => {
                    let name = name.to_lowercase();
                    let item_name = item_name.to_lowercase();
                    name.contains(&item_name) || item_name.contains(&name)
                }
                _ => false,
            },
        }
    }

    /// Time-correlated variant for rows whose id the event did not carry.
    /// `item_id` here is the parent test id, not the result row id.
    ///
    /// The first candidate in list order inside the candidate window is
    /// selected; ties are not broken by closeness. The queried row matches
    /// when its own timestamp lands inside the confirm window around that
    /// candidate.
    pub fn matches_by_time(
        &self,
        item_id: &str,
        item_name: Option<&str>,
        item_time: Option<DateTime<Utc>>,
        candidates: &[CandidateItem],
        policy: &MatchPolicy,
    ) -> bool {
        if self.kind != EntityKind::Test || !self.time_correlated {
            return self.matches(item_id, Some(EntityKind::Test), item_name);
        }
        if self.entity_id.as_deref() != Some(item_id) {
            return false;
        }
        let (Some(event_time), Some(item_time)) = (self.event_time, item_time) else {
            return false;
        };
        let candidate_window = Duration::milliseconds(policy.candidate_window_ms);
        let confirm_window = Duration::milliseconds(policy.confirm_window_ms);
        let matched = candidates
            .iter()
            .filter_map(|c| c.recorded_at)
            .find(|t| (*t - event_time).abs() <= candidate_window);
        match matched {
            Some(candidate_time) => (item_time - candidate_time).abs() <= confirm_window,
            None => false,
        }
    }
}
