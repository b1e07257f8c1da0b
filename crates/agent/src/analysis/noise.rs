//! Noise classification (spec.md §4.1 stage 9: "compute a noise verdict
//! for the alert"). Runs for every alert, pod-scoped or not, and again
//! once features are known so the verdict can use derived evidence.
//!
//! `original_source/agent/pipeline/noise.py` was not part of the
//! retrieved source pack, so the concrete heuristic below is this
//! implementation's own choice (SPEC_FULL §9 Open Question, recorded in
//! DESIGN.md) rather than a port of the original.

use crate::model::analysis::{Features, NoiseVerdict};
use crate::model::AlertEvent;

const NOISE_SEVERITIES: &[&str] = &["info", "none"];
const NOISE_ANNOTATION_MARKERS: &[&str] = &["test alert", "synthetic", "this is a test"];

/// First pass: alert labels/annotations only, before any collector runs.
#[must_use]
pub fn analyze_noise(alert: &AlertEvent) -> NoiseVerdict {
    if let Some(severity) = alert.label("severity") {
        if NOISE_SEVERITIES.contains(&severity.to_ascii_lowercase().as_str()) {
            return NoiseVerdict { is_noise: true, reason: Some(format!("severity={severity}")) };
        }
    }
    for value in alert.annotations.values() {
        let lower = value.to_ascii_lowercase();
        if NOISE_ANNOTATION_MARKERS.iter().any(|marker| lower.contains(marker)) {
            return NoiseVerdict {
                is_noise: true,
                reason: Some("annotation marks this as a test/synthetic alert".to_string()),
            };
        }
    }
    NoiseVerdict { is_noise: false, reason: None }
}

/// Second pass: refine using derived features (e.g. a pod that is
/// `Running` with zero restarts across the window looks routine even if
/// nothing in the raw alert flagged it).
pub fn postprocess_noise(verdict: &mut NoiseVerdict, features: &Features) {
    if verdict.is_noise {
        return;
    }
    if features.pod_phase.as_deref() == Some("Running")
        && features.restart_rate_5m_max == Some(0.0)
        && features.waiting_reason.is_none()
    {
        verdict.is_noise = true;
        verdict.reason = Some("pod running with no restarts or waiting reason in window".to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Family;
    use std::collections::HashMap;

    fn alert_with_severity(severity: &str) -> AlertEvent {
        let mut labels = HashMap::new();
        labels.insert("severity".to_string(), severity.to_string());
        AlertEvent {
            fingerprint: "fp".into(),
            labels,
            annotations: HashMap::new(),
            starts_at: None,
            ends_at: None,
            generator_url: String::new(),
            status: "active".into(),
        }
    }

    #[test]
    fn info_severity_is_noise() {
        let verdict = analyze_noise(&alert_with_severity("info"));
        assert!(verdict.is_noise);
    }

    #[test]
    fn critical_severity_is_not_noise() {
        let verdict = analyze_noise(&alert_with_severity("critical"));
        assert!(!verdict.is_noise);
    }

    #[test]
    fn postprocess_flags_quiet_running_pod() {
        let mut verdict = NoiseVerdict::default();
        let features = Features {
            family: Family::Generic,
            pod_phase: Some("Running".into()),
            ready: Some(true),
            waiting_reason: None,
            container_waiting: vec![],
            last_terminated: vec![],
            recent_event_reasons: vec![],
            restart_rate_5m_max: Some(0.0),
            http_5xx_rate: None,
            logs_status: None,
            probe_failure_type: None,
            crash_duration_seconds: None,
            exit_code: None,
            throttling_ratio: None,
            has_target: true,
        };
        postprocess_noise(&mut verdict, &features);
        assert!(verdict.is_noise);
    }
}
