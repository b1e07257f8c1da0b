//! Family enrichment (spec.md §4.6): the crashloop decision table, plus
//! a generic fallback used by the other families.

use crate::model::analysis::{EnrichmentLabel, FamilyEnrichment, Features};
use crate::model::evidence::ProbeFailureType;
use crate::model::Family;

/// Build the family-specific enrichment label and bullets. Only the
/// crashloop table is fully enumerated by spec.md §4.6; other families
/// get a minimal, still-deterministic fallback.
#[must_use]
pub fn enrich(features: &Features, parsed_error_patterns: &[String]) -> FamilyEnrichment {
    match features.family {
        Family::Crashloop => crashloop_enrichment(features, parsed_error_patterns),
        _ => generic_enrichment(features),
    }
}

fn crashloop_enrichment(features: &Features, parsed_error_patterns: &[String]) -> FamilyEnrichment {
    let exit_code = features.last_terminated.first().map(|t| t.exit_code);
    let reason = features.last_terminated.first().and_then(|t| t.reason.clone());

    let label = if exit_code == Some(137) || reason.as_deref() == Some("OOMKilled") {
        EnrichmentLabel::SuspectedOomCrash
    } else if exit_code == Some(0) && features.probe_failure_type == Some(ProbeFailureType::Liveness) {
        EnrichmentLabel::SuspectedLivenessProbeFailure
    } else if parsed_error_patterns
        .iter()
        .any(|p| p.contains("ECONNREFUSED") || p.to_ascii_lowercase().contains("connection refused"))
    {
        EnrichmentLabel::SuspectedDependencyUnavailable
    } else if parsed_error_patterns.iter().any(|p| {
        p.contains("FileNotFoundError") || p.to_ascii_lowercase().contains("permission denied")
    }) {
        EnrichmentLabel::SuspectedConfigOrPermissionError
    } else if exit_code == Some(1) && features.crash_duration_seconds.is_some_and(|d| d < 10.0) {
        EnrichmentLabel::SuspectedAppStartupFailure
    } else if exit_code == Some(1) && features.crash_duration_seconds.is_some_and(|d| d > 60.0) {
        EnrichmentLabel::SuspectedAppRuntimeFailure
    } else {
        EnrichmentLabel::UnknownNeedsHuman
    };

    let mut why = Vec::new();
    if let Some(phase) = &features.pod_phase {
        why.push(format!("pod status: {phase}"));
    }
    if let Some(rate) = features.restart_rate_5m_max {
        why.push(format!("restart rate (5m max): {rate}"));
    }
    if let Some(duration) = features.crash_duration_seconds {
        why.push(format!("crash duration: {duration}s"));
    }
    if let Some(probe) = features.probe_failure_type {
        if probe != ProbeFailureType::None {
            why.push(format!("probe failure: {probe:?}"));
        }
    }

    let mut next_steps = vec![
        "run promql.instant on rate(kube_pod_container_status_restarts_total[5m]) for this pod"
            .to_string(),
        "inspect the previous container log via k8s.pod_context (previous=true)".to_string(),
    ];
    if !features.has_target {
        next_steps.push("no pod resolved for this alert; see the no-pod scenario".to_string());
    }

    FamilyEnrichment { label, why, next_steps }
}

fn generic_enrichment(features: &Features) -> FamilyEnrichment {
    let mut why = Vec::new();
    if let Some(phase) = &features.pod_phase {
        why.push(format!("pod status: {phase}"));
    }
    if let Some(rate) = features.restart_rate_5m_max {
        why.push(format!("restart rate (5m max): {rate}"));
    }
    if why.is_empty() {
        why.push("no evidence collected for this family".to_string());
    }

    let mut next_steps = vec![
        "run promql.instant on rate(kube_pod_container_status_restarts_total[5m]) for this pod"
            .to_string(),
        "inspect the previous container log via k8s.pod_context (previous=true)".to_string(),
    ];
    if !features.has_target {
        next_steps.push("no pod resolved for this alert; see the no-pod scenario".to_string());
    }

    FamilyEnrichment { label: EnrichmentLabel::UnknownNeedsHuman, why, next_steps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::analysis::LastTerminatedSummary;

    fn base_features() -> Features {
        Features {
            family: Family::Crashloop,
            pod_phase: Some("Running".into()),
            ready: Some(false),
            waiting_reason: None,
            container_waiting: vec![],
            last_terminated: vec![],
            recent_event_reasons: vec![],
            restart_rate_5m_max: Some(4.0),
            http_5xx_rate: None,
            logs_status: None,
            probe_failure_type: None,
            crash_duration_seconds: None,
            exit_code: None,
            throttling_ratio: None,
            has_target: true,
        }
    }

    #[test]
    fn oom_exit_code_takes_highest_precedence() {
        let mut features = base_features();
        features.last_terminated = vec![LastTerminatedSummary { container: "c".into(), exit_code: 137, reason: None }];
        let enrichment = enrich(&features, &[]);
        assert_eq!(enrichment.label, EnrichmentLabel::SuspectedOomCrash);
    }

    #[test]
    fn liveness_failure_with_clean_exit() {
        let mut features = base_features();
        features.last_terminated = vec![LastTerminatedSummary { container: "c".into(), exit_code: 0, reason: None }];
        features.probe_failure_type = Some(ProbeFailureType::Liveness);
        let enrichment = enrich(&features, &[]);
        assert_eq!(enrichment.label, EnrichmentLabel::SuspectedLivenessProbeFailure);
    }

    #[test]
    fn dependency_unavailable_from_parsed_errors() {
        let features = base_features();
        let enrichment = enrich(&features, &["connect: ECONNREFUSED".to_string()]);
        assert_eq!(enrichment.label, EnrichmentLabel::SuspectedDependencyUnavailable);
    }

    #[test]
    fn short_crash_is_startup_failure() {
        let mut features = base_features();
        features.last_terminated = vec![LastTerminatedSummary { container: "c".into(), exit_code: 1, reason: None }];
        features.crash_duration_seconds = Some(2.0);
        let enrichment = enrich(&features, &[]);
        assert_eq!(enrichment.label, EnrichmentLabel::SuspectedAppStartupFailure);
    }

    #[test]
    fn long_crash_is_runtime_failure() {
        let mut features = base_features();
        features.last_terminated = vec![LastTerminatedSummary { container: "c".into(), exit_code: 1, reason: None }];
        features.crash_duration_seconds = Some(120.0);
        let enrichment = enrich(&features, &[]);
        assert_eq!(enrichment.label, EnrichmentLabel::SuspectedAppRuntimeFailure);
    }

    #[test]
    fn next_steps_always_include_restart_rate_and_previous_log_suggestions() {
        let features = base_features();
        let enrichment = enrich(&features, &[]);
        assert!(enrichment.next_steps.iter().any(|s| s.contains("kube_pod_container_status_restarts_total")));
        assert!(enrichment.next_steps.iter().any(|s| s.contains("previous container log")));
    }

    #[test]
    fn missing_target_adds_no_pod_hint() {
        let mut features = base_features();
        features.has_target = false;
        let enrichment = enrich(&features, &[]);
        assert!(enrichment.next_steps.iter().any(|s| s.contains("no-pod")));
    }
}
