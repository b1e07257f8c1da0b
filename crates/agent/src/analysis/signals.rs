//! Curated signal queries (spec.md §4.1 stage 9: "for non-pod targets,
//! enrich with signal queries"). Ensures every non-pod investigation has
//! a baseline metrics slice even when the matched module/playbook didn't
//! collect one. Deterministic, read-only, never raises.
//!
//! Grounded on `original_source/agent/pipeline/signals.py`
//! (`_should_try_http_5xx`, `enrich_investigation_with_signal_queries`).

use std::collections::HashMap;

use crate::model::evidence::MetricsEvidence;
use crate::model::window::TimeWindow;
use crate::providers::metrics::PromqlProvider;

/// `agent/pipeline/signals.py::_should_try_http_5xx`: case-insensitive
/// substring match of "5xx"/"http" against `alertname + " " + playbook`.
#[must_use]
pub fn should_try_http_5xx(alertname: &str, playbook: Option<&str>) -> bool {
    let text = format!("{alertname} {}", playbook.unwrap_or("")).to_lowercase();
    text.contains("5xx") || text.contains("http")
}

/// Build a generic HTTP 5xx-rate query from whatever service-ish labels
/// the alert carries, mirroring `prom_provider.query_http_5xx_generic`'s
/// label-driven selector construction (no fixed metric name is named in
/// spec.md; `http_requests_total` is this implementation's choice).
#[must_use]
pub fn http_5xx_query(labels: &HashMap<String, String>) -> String {
    let mut selector: Vec<String> = ["namespace", "service", "job"]
        .iter()
        .filter_map(|key| labels.get(*key).map(|value| format!(r#"{key}="{value}""#)))
        .collect();
    selector.sort();
    let selector = if selector.is_empty() { String::new() } else { format!(",{}", selector.join(",")) };
    format!(r#"sum(rate(http_requests_total{{status=~"5.."{selector}}}[5m]))"#)
}

/// Fill `evidence.metrics.http_5xx` when the target isn't pod-scoped and
/// the alert/playbook names HTTP/5xx traffic. Leaves the slot alone if
/// it is already filled (pod-scoped baseline collectors own it there).
pub async fn enrich_with_signal_queries(
    metrics: &dyn PromqlProvider,
    labels: &HashMap<String, String>,
    alertname: &str,
    playbook: Option<&str>,
    window: &TimeWindow,
    evidence: &mut MetricsEvidence,
    errors: &mut Vec<String>,
) {
    if !evidence.http_5xx.is_empty() || !should_try_http_5xx(alertname, playbook) {
        return;
    }
    let query = http_5xx_query(labels);
    match metrics.range(&query, window.start, window.end, 60).await {
        Ok(series) => evidence.http_5xx = series,
        Err(err) => errors.push(format!("signals:{err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_5xx_keyword() {
        assert!(should_try_http_5xx("HTTPErrorRateHigh", None));
        assert!(should_try_http_5xx("SomeAlert", Some("5xx_playbook")));
        assert!(!should_try_http_5xx("CPUThrottlingHigh", Some("cpu")));
    }

    #[test]
    fn query_includes_present_labels_only() {
        let mut labels = HashMap::new();
        labels.insert("namespace".to_string(), "ns1".to_string());
        let query = http_5xx_query(&labels);
        assert!(query.contains(r#"namespace="ns1""#));
        assert!(!query.contains("service="));
    }

    #[tokio::test]
    async fn leaves_already_filled_slot_untouched() {
        use crate::providers::metrics::MockPromqlProvider;
        let mock = MockPromqlProvider::default();
        let mut evidence = MetricsEvidence {
            http_5xx: vec![crate::model::evidence::LabelledSeries { labels: HashMap::new(), samples: vec![] }],
            ..Default::default()
        };
        let mut errors = Vec::new();
        let window = TimeWindow { expr: "1h".into(), start: chrono::Utc::now(), end: chrono::Utc::now() };
        enrich_with_signal_queries(&mock, &HashMap::new(), "HTTP5xx", None, &window, &mut evidence, &mut errors).await;
        assert_eq!(evidence.http_5xx.len(), 1);
    }
}
