//! Inbound alert event (spec.md §3, §6) and its derived lifecycle
//! fields. The raw webhook payload is assumed already normalized to
//! this shape by the external HTTP receiver (out of scope, spec.md §1).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `normalized_state`: a pure function of the raw state string (I2, P1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedState {
    Firing,
    Resolved,
    Unknown,
}

/// `ends_at_kind`: pairs with `normalized_state` per spec.md §6 table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndsAtKind {
    ExpiresAt,
    ResolvedAt,
    Unknown,
}

/// Classify a raw Alertmanager-style state string (spec.md §6, P1).
#[must_use]
pub fn normalize_state(raw: &str) -> (NormalizedState, EndsAtKind) {
    match raw.to_ascii_lowercase().as_str() {
        "active" | "suppressed" | "unprocessed" => (NormalizedState::Firing, EndsAtKind::ExpiresAt),
        "inactive" | "resolved" => (NormalizedState::Resolved, EndsAtKind::ResolvedAt),
        _ => (NormalizedState::Unknown, EndsAtKind::Unknown),
    }
}

/// One alert event from the webhook (spec.md §3 "Alert event").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AlertEvent {
    pub fingerprint: String,
    pub labels: HashMap<String, String>,
    pub annotations: HashMap<String, String>,
    pub starts_at: Option<DateTime<Utc>>,
    /// The zero-valued epoch timestamp means "still firing"; represented
    /// here as `None` so callers don't need to recognize the sentinel.
    pub ends_at: Option<DateTime<Utc>>,
    pub generator_url: String,
    /// Raw state string, e.g. "active"/"resolved"/"firing".
    pub status: String,
}

impl AlertEvent {
    #[must_use]
    pub fn normalized_state(&self) -> NormalizedState {
        normalize_state(&self.status).0
    }

    #[must_use]
    pub fn ends_at_kind(&self) -> EndsAtKind {
        normalize_state(&self.status).1
    }

    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn alertname(&self) -> &str {
        self.label("alertname").unwrap_or("")
    }

    /// Fetch the first present label among several candidate keys.
    #[must_use]
    pub fn label_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.label(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p1_alert_lifecycle_covers_every_raw_state() {
        assert_eq!(normalize_state("active"), (NormalizedState::Firing, EndsAtKind::ExpiresAt));
        assert_eq!(normalize_state("suppressed"), (NormalizedState::Firing, EndsAtKind::ExpiresAt));
        assert_eq!(normalize_state("unprocessed"), (NormalizedState::Firing, EndsAtKind::ExpiresAt));
        assert_eq!(normalize_state("inactive"), (NormalizedState::Resolved, EndsAtKind::ResolvedAt));
        assert_eq!(normalize_state("resolved"), (NormalizedState::Resolved, EndsAtKind::ResolvedAt));
        assert_eq!(normalize_state("bogus"), (NormalizedState::Unknown, EndsAtKind::Unknown));
    }

    #[test]
    fn s2_alertmanager_active_state() {
        let (state, kind) = normalize_state("active");
        assert_eq!(state, NormalizedState::Firing);
        assert_eq!(kind, EndsAtKind::ExpiresAt);
    }

    #[test]
    fn state_matching_is_case_insensitive() {
        assert_eq!(normalize_state("ACTIVE").0, NormalizedState::Firing);
    }
}
