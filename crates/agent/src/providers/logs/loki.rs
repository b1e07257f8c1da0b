//! Loki dialect: LogQL query construction and response parsing
//! (spec.md §4.3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::LogEntry;

/// Build a Loki label selector, e.g. `{namespace="ns1",pod="p1"}`.
/// Keys listed in `regex_fields` are queried with `=~` (regex match)
/// rather than `=` (exact match); the caller decides which fields are
/// regex via `LogsQuery::regex_mode` (spec.md §4.3).
#[must_use]
pub fn build_selector(labels: &[(&str, &str)], regex_fields: &[&str]) -> String {
    let body = labels
        .iter()
        .map(|(k, v)| {
            let op = if regex_fields.contains(k) { "=~" } else { "=" };
            format!(r#"{k}{op}"{v}""#)
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{{body}}}")
}

#[must_use]
pub fn to_unix_nanos(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_nanos_opt().unwrap_or(0)
}

/// Map loki's label variants onto the canonical `pod`/`namespace` keys
/// (spec.md §4.3: "Map label variants").
fn canonicalize_labels(mut raw: HashMap<String, String>) -> HashMap<String, String> {
    if let Some(pod) = raw.remove("pod").or_else(|| raw.remove("k8s_pod")).or_else(|| raw.remove("pod_name")) {
        raw.insert("pod".to_string(), pod);
    }
    if let Some(ns) = raw.remove("namespace").or_else(|| raw.remove("k8s_namespace")) {
        raw.insert("namespace".to_string(), ns);
    }
    raw
}

#[derive(Debug, Deserialize)]
struct QueryRangeResponse {
    data: QueryRangeData,
}

#[derive(Debug, Deserialize)]
struct QueryRangeData {
    result: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
struct StreamResult {
    stream: HashMap<String, String>,
    values: Vec<(String, String)>,
}

/// Parse the standard Loki `query_range` response shape.
#[must_use]
pub fn parse_query_range_response(body: &str) -> Vec<LogEntry> {
    let Ok(parsed) = serde_json::from_str::<QueryRangeResponse>(body) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for result in parsed.data.result {
        let labels = canonicalize_labels(result.stream);
        for (ts_ns, message) in result.values {
            let Ok(ts_ns) = ts_ns.parse::<i64>() else { continue };
            let timestamp = DateTime::from_timestamp(ts_ns / 1_000_000_000, (ts_ns % 1_000_000_000) as u32)
                .unwrap_or_default();
            entries.push(LogEntry {
                timestamp,
                message,
                labels: labels.clone(),
            });
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_exact_match_selector() {
        let selector = build_selector(&[("namespace", "default"), ("container", "app")], &[]);
        assert_eq!(selector, r#"{namespace="default",container="app"}"#);
    }

    #[test]
    fn pod_field_uses_regex_match_when_requested() {
        let selector = build_selector(&[("pod", "^web-.*")], &["pod"]);
        assert_eq!(selector, r#"{pod=~"^web-.*"}"#);
    }

    #[test]
    fn pod_field_uses_exact_match_when_not_requested() {
        let selector = build_selector(&[("pod", "web-1")], &[]);
        assert_eq!(selector, r#"{pod="web-1"}"#);
    }

    #[test]
    fn s4_parses_k8s_namespace_fallback_response() {
        let body = serde_json::json!({
            "status": "success",
            "data": {
                "resultType": "streams",
                "result": [{
                    "stream": {"k8s_namespace": "default", "k8s_pod": "mysql"},
                    "values": [["1735689600000000000", "mysql log entry"]]
                }]
            }
        })
        .to_string();
        let entries = parse_query_range_response(&body);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "mysql log entry");
        assert_eq!(entries[0].labels.get("namespace").map(String::as_str), Some("default"));
    }
}
