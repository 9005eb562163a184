// Highlight reference parsing
//
// A single parse step turns the navigation parameters into a tagged
// reference. The `highlight*` keys are checked in a fixed priority order
// and the first one present wins; any others are ignored. No key present
// means no reference, nothing is highlighted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::params::{keys, NavParams};

/// Entity kinds a notification can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Test,
    Exam,
    Plan,
    User,
    Payment,
    Subscription,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Test => "test",
            EntityKind::Exam => "exam",
            EntityKind::Plan => "plan",
            EntityKind::User => "user",
            EntityKind::Payment => "payment",
            EntityKind::Subscription => "subscription",
        }
    }
}

/// The item a notification pointed at, derived from navigation parameters.
///
/// An empty-string id in the parameters is kept as `None`: the reference is
/// still active but matching falls back to the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightReference {
    pub kind: EntityKind,
    /// Exact entity id; when present, name fallback is never consulted
    pub entity_id: Option<String>,
    /// Human-readable label, fallback matcher only
    pub display_name: Option<String>,
    /// When the originating event was recorded
    pub event_time: Option<DateTime<Utc>>,
    /// True for `highlightTestByTime`: correlate by timestamp proximity
    pub time_correlated: bool,
}

/// Priority order for the trigger keys. First present wins.
const PRIORITY: &[(&str, EntityKind, bool)] = &[
    (keys::HIGHLIGHT_TEST, EntityKind::Test, false),
    (keys::HIGHLIGHT_TEST_BY_TIME, EntityKind::Test, true),
    (keys::HIGHLIGHT_EXAM, EntityKind::Exam, false),
    (keys::HIGHLIGHT_PLAN, EntityKind::Plan, false),
    (keys::HIGHLIGHT_USER, EntityKind::User, false),
    (keys::HIGHLIGHT_PAYMENT, EntityKind::Payment, false),
    (keys::HIGHLIGHT_SUBSCRIPTION, EntityKind::Subscription, false),
];

impl HighlightReference {
    /// Derive a reference from navigation parameters, or `None` when no
    /// trigger key is present. Total over its input: malformed values
    /// degrade to absent fields, never to an error.
    pub fn parse(params: &NavParams) -> Option<Self> {
        for (key, kind, time_correlated) in PRIORITY {
            let Some(raw_id) = params.get(key) else {
                continue;
            };
            let entity_id = if raw_id.is_empty() {
                None
            } else {
                Some(raw_id.to_string())
            };
            let display_name = name_key(*kind)
                .and_then(|k| params.get(k))
                .filter(|name| !name.is_empty())
                .map(str::to_string);
            let time_key = if *time_correlated {
                keys::TEST_TIMESTAMP
            } else {
                keys::NOTIFICATION_TIME
            };
            let event_time = params.get(time_key).and_then(parse_timestamp);
            return Some(Self {
                kind: *kind,
                entity_id,
                display_name,
                event_time,
                time_correlated: *time_correlated,
            });
        }
        None
    }
}

fn name_key(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Test => Some(keys::TEST_NAME),
        EntityKind::Exam => Some(keys::EXAM_NAME),
        EntityKind::Plan => Some(keys::PLAN_NAME),
        EntityKind::User => Some(keys::USER_NAME),
        EntityKind::Payment | EntityKind::Subscription => None,
    }
}

/// Accepts epoch milliseconds or RFC 3339; anything else counts as absent.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ms) = raw.parse::<i64>() {
        return Utc.timestamp_millis_opt(ms).single();
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
