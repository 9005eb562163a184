// Navigation parameter map
//
// Highlight references ride in the query string of a navigation. The
// correlator never talks to a router: it reads a parameter map handed in by
// the view layer and hands back a replacement map when the highlight is
// cleared.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved query-string keys carrying a notification reference.
///
/// These keys are set by the event-handling layer when a real-time
/// notification triggers a navigation, and stripped again when the
/// highlight is cleared or expires.
pub mod keys {
    /// Test entity id, matched exactly
    pub const HIGHLIGHT_TEST: &str = "highlightTest";
    /// Test id for time-correlated matching (result row id unknown)
    pub const HIGHLIGHT_TEST_BY_TIME: &str = "highlightTestByTime";
    /// Exam entity id
    pub const HIGHLIGHT_EXAM: &str = "highlightExam";
    /// Plan entity id
    pub const HIGHLIGHT_PLAN: &str = "highlightPlan";
    /// User entity id
    pub const HIGHLIGHT_USER: &str = "highlightUser";
    /// Payment entity id
    pub const HIGHLIGHT_PAYMENT: &str = "highlightPayment";
    /// Subscription entity id
    pub const HIGHLIGHT_SUBSCRIPTION: &str = "highlightSubscription";
    /// Display name companion for `highlightTest`
    pub const TEST_NAME: &str = "testName";
    /// Display name companion for `highlightExam`
    pub const EXAM_NAME: &str = "examName";
    /// Display name companion for `highlightPlan`
    pub const PLAN_NAME: &str = "planName";
    /// Display name companion for `highlightUser`
    pub const USER_NAME: &str = "userName";
    /// ISO 8601 timestamp of the originating event (time-correlated mode)
    pub const TEST_TIMESTAMP: &str = "testTimestamp";
    /// Epoch-millis timestamp for non-time-correlated entity types
    pub const NOTIFICATION_TIME: &str = "notificationTime";

    /// Every key owned by the highlight mechanism.
    pub const ALL: &[&str] = &[
        HIGHLIGHT_TEST,
        HIGHLIGHT_TEST_BY_TIME,
        HIGHLIGHT_EXAM,
        HIGHLIGHT_PLAN,
        HIGHLIGHT_USER,
        HIGHLIGHT_PAYMENT,
        HIGHLIGHT_SUBSCRIPTION,
        TEST_NAME,
        EXAM_NAME,
        PLAN_NAME,
        USER_NAME,
        TEST_TIMESTAMP,
        NOTIFICATION_TIME,
    ];
}

/// Query-string parameter map for one navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavParams(HashMap<String, String>);

impl NavParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string (with or without leading `?`). Pairs that fail
    /// to decode are skipped; nothing here is an error.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut map = HashMap::new();
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
            let (Some(key), Some(value)) = (decode_component(raw_key), decode_component(raw_value))
            else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            map.insert(key, value);
        }
        Self(map)
    }

    /// Serialize back to a query string, keys sorted for stable output.
    pub fn to_query(&self) -> String {
        let mut pairs: Vec<(&String, &String)> = self.0.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        let mut out = String::new();
        for (key, value) in pairs {
            if !out.is_empty() {
                out.push('&');
            }
            encode_component(key, &mut out);
            out.push('=');
            encode_component(value, &mut out);
        }
        out
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Builder-style insert for constructing maps inline.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove every highlight-owned key, leaving unrelated parameters
    /// untouched. This is the "strip" half of clearing a highlight.
    pub fn strip_highlight(&mut self) {
        for key in keys::ALL {
            self.0.remove(*key);
        }
    }

    /// True if any `highlight*` trigger key is present.
    pub fn has_highlight(&self) -> bool {
        self.contains(keys::HIGHLIGHT_TEST)
            || self.contains(keys::HIGHLIGHT_TEST_BY_TIME)
            || self.contains(keys::HIGHLIGHT_EXAM)
            || self.contains(keys::HIGHLIGHT_PLAN)
            || self.contains(keys::HIGHLIGHT_USER)
            || self.contains(keys::HIGHLIGHT_PAYMENT)
            || self.contains(keys::HIGHLIGHT_SUBSCRIPTION)
    }
}

fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes.get(i + 1..i + 3)?;
                let hex = std::str::from_utf8(hex).ok()?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

fn encode_component(raw: &str, out: &mut String) {
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{b:02X}"));
            }
        }
    }
}
