//! `historical_fallback` (spec.md §4.2): activated when the live K8s
//! API reports the target pod as not found. Re-anchors the time window
//! to the alert's own `starts_at` and recovers a pod name guess from the
//! alert annotations so logs can still be queried by pattern.

use lazy_static::lazy_static;
use regex::Regex;

use crate::collectors::CollectorSlots;
use crate::model::{AlertEvent, TargetRef, TimeWindow};
use crate::pipeline::AgentContext;
use crate::providers::logs::LogsQuery;
use scm::clean::strip_known_suffix;

/// Ordered annotation-scraping patterns (spec.md §4.2 "Historical
/// fallback"), tried in order; first match wins.
lazy_static! {
    static ref POD_NAME_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"pod:\s*([A-Za-z0-9][A-Za-z0-9._-]+)").unwrap(),
        Regex::new(r"Pod\s+([A-Za-z0-9][A-Za-z0-9._-]+)").unwrap(),
        Regex::new(r"Kubernetes pod `([A-Za-z0-9][A-Za-z0-9._-]+)`").unwrap(),
    ];
}

/// Best-effort pod name guess from free-text alert annotations, used
/// only once the live lookup has already failed.
#[must_use]
pub fn guess_pod_name(alert: &AlertEvent) -> Option<String> {
    let haystacks: Vec<&str> = alert.annotations.values().map(String::as_str).collect();
    for pattern in POD_NAME_PATTERNS.iter() {
        for haystack in &haystacks {
            if let Some(capture) = pattern.captures(haystack) {
                return Some(capture[1].to_string());
            }
        }
    }
    // Last resort: any annotation value over 3 chars that looks like a
    // generated pod name (contains a hyphen).
    haystacks
        .into_iter()
        .find(|v| v.len() > 3 && v.contains('-') && !v.contains(' '))
        .map(str::to_string)
}

/// Re-anchor the window to the alert's own `starts_at` and query logs by
/// a `^<workload>-.*` regex instead of an exact pod name.
pub async fn collect(
    ctx: &AgentContext,
    alert: &AlertEvent,
    target: &TargetRef,
) -> (CollectorSlots, TimeWindow) {
    let mut slots = CollectorSlots::default();
    slots.target.historical_mode = true;

    let now = chrono::Utc::now();
    let window = TimeWindow { expr: "historical".to_string(), start: alert.starts_at.unwrap_or(now), end: now };

    let Some(namespace) = target.namespace.clone() else {
        slots.errors.push(("historical_fallback", "no_namespace".to_string()));
        return (slots, window);
    };
    let Some(guessed_pod) = guess_pod_name(alert) else {
        slots.errors.push(("historical_fallback", "no_pod_guess".to_string()));
        return (slots, window);
    };

    let prefix = strip_known_suffix(&guessed_pod).unwrap_or(&guessed_pod).to_string();
    let query = LogsQuery {
        namespace: &namespace,
        pod: &format!("^{prefix}-.*"),
        container: None,
        start: window.start,
        end: window.end,
        limit: 200,
        regex_mode: true,
    };
    let result = ctx.logs.fetch(&query).await;
    slots.logs = Some(crate::model::evidence::LogsEvidence {
        entries: result.entries,
        status: Some(result.status),
        reason: result.reason,
        backend: result.backend,
        query_used: result.query_used,
        parsed_error_patterns: Vec::new(),
    });
    slots.succeeded = true;
    (slots, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn alert_with(annotation: &str) -> AlertEvent {
        let mut annotations = HashMap::new();
        annotations.insert("description".to_string(), annotation.to_string());
        AlertEvent {
            fingerprint: "f1".to_string(),
            labels: HashMap::new(),
            annotations,
            starts_at: Some(chrono::Utc::now()),
            ends_at: None,
            generator_url: String::new(),
            status: "firing".to_string(),
        }
    }

    #[test]
    fn matches_colon_pattern() {
        let alert = alert_with("pod: my-app-6f9d8-abcde crashed");
        assert_eq!(guess_pod_name(&alert).as_deref(), Some("my-app-6f9d8-abcde"));
    }

    #[test]
    fn matches_backtick_pattern() {
        let alert = alert_with("Kubernetes pod `my-app-6f9d8` restarted too often");
        assert_eq!(guess_pod_name(&alert).as_deref(), Some("my-app-6f9d8"));
    }

    #[test]
    fn falls_back_to_hyphenated_value() {
        let alert = alert_with("my-app-6f9d8");
        assert_eq!(guess_pod_name(&alert).as_deref(), Some("my-app-6f9d8"));
    }
}
