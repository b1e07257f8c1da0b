//! `crashloop` collector (spec.md §4.2): runs `pod_baseline` then adds
//! the previous container log, probe-failure classification, and crash
//! duration that only matter for crash-looping pods.

use async_trait::async_trait;

use crate::collectors::{pod_baseline, CollectorSlots, DiagnosticModule};
use crate::model::evidence::ProbeFailureType;
use crate::model::{Family, TargetRef};
use crate::pipeline::AgentContext;

pub struct CrashloopModule;

#[async_trait]
impl DiagnosticModule for CrashloopModule {
    fn name(&self) -> &'static str {
        "crashloop"
    }

    fn applies(&self, family: Family, target: &TargetRef) -> bool {
        family == Family::Crashloop && target.pod.is_some() && target.namespace.is_some()
    }

    async fn collect(&self, ctx: &AgentContext, target: &TargetRef) -> CollectorSlots {
        let mut slots = pod_baseline::gather(ctx, target).await;
        let Some(k8s) = slots.k8s.as_mut() else {
            return slots;
        };

        let probe_failure_type = classify_probe_failure(&k8s.pod_events);
        k8s.probe_failure_type = Some(probe_failure_type);

        if let Some(terminated) = k8s.pod_info.as_ref().and_then(|p| {
            p.containers.iter().find_map(|c| c.last_terminated.as_ref())
        }) {
            if let (Some(started), Some(finished)) = (terminated.started_at, terminated.finished_at) {
                k8s.crash_duration_seconds = Some((finished - started).num_seconds() as f64);
            }
        }

        let (namespace, pod) = match (target.namespace.as_deref(), target.pod.as_deref()) {
            (Some(ns), Some(pod)) => (ns, pod),
            _ => return slots,
        };
        let container = k8s
            .pod_info
            .as_ref()
            .and_then(|p| p.containers.first())
            .map(|c| c.name.clone())
            .or_else(|| target.container.clone());

        if let Some(container) = container {
            match ctx.k8s.previous_container_logs(namespace, pod, &container, 200).await {
                Ok(lines) => {
                    let patterns = scan_error_patterns(&lines);
                    k8s.previous_container_logs = Some(lines);
                    if let Some(logs) = slots.logs.as_mut() {
                        logs.parsed_error_patterns = patterns;
                    }
                }
                Err(err) => slots.errors.push(("crashloop", err.for_subsystem("k8s"))),
            }
        }

        slots
    }
}

/// Scan pod events for the liveness/readiness probe-failure substrings
/// spec.md §4.2 "Crashloop" names explicitly.
fn classify_probe_failure(events: &[crate::model::PodEvent]) -> ProbeFailureType {
    let liveness = events.iter().any(|e| e.message.contains("Liveness probe failed"));
    let readiness = events.iter().any(|e| e.message.contains("Readiness probe failed"));
    if liveness {
        ProbeFailureType::Liveness
    } else if readiness {
        ProbeFailureType::Readiness
    } else {
        ProbeFailureType::None
    }
}

/// Known crash-cause substrings the enrichment table matches against
/// (spec.md §4.6 crashloop decision table).
const KNOWN_PATTERNS: &[&str] = &[
    "ECONNREFUSED",
    "connection refused",
    "FileNotFoundError",
    "permission denied",
];

fn scan_error_patterns(lines: &[String]) -> Vec<String> {
    let mut found = Vec::new();
    for line in lines {
        for pattern in KNOWN_PATTERNS {
            if line.contains(pattern) && !found.iter().any(|f: &String| f == pattern) {
                found.push((*pattern).to_string());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PodEvent;
    use chrono::Utc;

    fn event(message: &str) -> PodEvent {
        PodEvent {
            reason: "Unhealthy".to_string(),
            message: message.to_string(),
            event_type: "Warning".to_string(),
            timestamp: Utc::now(),
            count: 1,
        }
    }

    #[test]
    fn classifies_liveness_over_readiness() {
        let events = vec![event("Liveness probe failed: HTTP 500"), event("Readiness probe failed")];
        assert_eq!(classify_probe_failure(&events), ProbeFailureType::Liveness);
    }

    #[test]
    fn no_probe_events_yields_none() {
        assert_eq!(classify_probe_failure(&[]), ProbeFailureType::None);
    }

    #[test]
    fn scans_known_error_patterns_without_duplicates() {
        let lines = vec![
            "connect: ECONNREFUSED 10.0.0.1:5432".to_string(),
            "another ECONNREFUSED here".to_string(),
        ];
        let found = scan_error_patterns(&lines);
        assert_eq!(found, vec!["ECONNREFUSED".to_string()]);
    }
}
