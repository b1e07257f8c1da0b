//! VictoriaLogs dialect: LogsQL query construction and NDJSON response
//! parsing (spec.md §4.3).

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::model::LogEntry;

/// Whitelist of labels carried over from each NDJSON line.
const LABEL_WHITELIST: &[&str] = &["namespace", "pod", "container", "k8s_namespace", "k8s_pod"];

fn escape_logsql_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build a LogsQL expression, e.g. `namespace:"ns1" AND pod:"p1"`, with
/// `k:re("pattern")` substituted for keys listed in `regex_fields` (the
/// caller decides which fields are regex via `LogsQuery::regex_mode`,
/// spec.md §4.3).
#[must_use]
pub fn build_query(labels: &[(&str, &str)], regex_fields: &[&str]) -> String {
    labels
        .iter()
        .map(|(k, v)| {
            let escaped = escape_logsql_value(v);
            if regex_fields.contains(k) {
                format!(r#"{k}:re("{escaped}")"#)
            } else {
                format!(r#"{k}:"{escaped}""#)
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

#[must_use]
pub fn to_rfc3339_z(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

fn extract_message(value: &serde_json::Value) -> Option<String> {
    for key in ["_msg", "message", "msg", "log", "text"] {
        if let Some(s) = value.get(key).and_then(serde_json::Value::as_str) {
            return Some(s.to_string());
        }
    }
    None
}

/// Parse one NDJSON line into a `LogEntry`. Returns `None` for
/// malformed lines (including blank ones) so callers can filter them.
#[must_use]
pub fn parse_ndjson_line(line: &str) -> Option<LogEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    let timestamp = value.get("_time").and_then(serde_json::Value::as_str)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    let message = extract_message(&value)?;

    let mut labels = HashMap::new();
    for key in LABEL_WHITELIST {
        if let Some(v) = value.get(key).and_then(serde_json::Value::as_str) {
            labels.insert((*key).to_string(), v.to_string());
        }
    }

    Some(LogEntry { timestamp, message, labels })
}

/// Parse a full NDJSON response body, one JSON object per line.
#[must_use]
pub fn parse_ndjson_response(body: &str) -> Vec<LogEntry> {
    body.lines().filter_map(parse_ndjson_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_joined_query() {
        let query = build_query(&[("namespace", "ns1"), ("container", "app")], &[]);
        assert_eq!(query, r#"namespace:"ns1" AND container:"app""#);
    }

    #[test]
    fn pod_field_uses_regex_mode_when_requested() {
        let query = build_query(&[("pod", "web-.*")], &["pod"]);
        assert_eq!(query, r#"pod:re("web-.*")"#);
    }

    #[test]
    fn pod_field_uses_exact_match_when_not_requested() {
        let query = build_query(&[("pod", "web-1")], &[]);
        assert_eq!(query, r#"pod:"web-1""#);
    }

    #[test]
    fn escapes_backslash_and_quote() {
        let query = build_query(&[("namespace", r#"a"b\c"#)], &[]);
        assert_eq!(query, r#"namespace:"a\"b\\c""#);
    }

    #[test]
    fn s3_ndjson_two_entries_newest_message_extracted() {
        let body = [
            r#"{"_time": "2026-01-01T19:09:01Z", "_msg": "first"}"#,
            r#"{"_time": "2026-01-01T19:09:02Z", "_msg": "second"}"#,
        ]
        .join("\n");
        let entries = parse_ndjson_response(&body);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].message, "second");
    }

    #[test]
    fn message_field_fallback_order() {
        let line = r#"{"_time": "2026-01-01T00:00:00Z", "log": "from log field"}"#;
        let entry = parse_ndjson_line(line).unwrap();
        assert_eq!(entry.message, "from log field");
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_ndjson_line("").is_none());
        assert!(parse_ndjson_line("   ").is_none());
    }
}
