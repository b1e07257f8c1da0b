//! Feature derivation (spec.md §4.6): a pure function of the filled
//! `Evidence` record plus the already-set `Family`.

use crate::model::analysis::{ContainerWaitingSummary, Features, LastTerminatedSummary};
use crate::model::{CollectionStatus, Evidence, Family};

const TOP_N: usize = 5;

/// Compute the derived feature record. Deterministic: the same evidence
/// always yields the same features (spec.md §4.6).
#[must_use]
pub fn compute_features(family: Family, evidence: &Evidence) -> Features {
    let k8s = evidence.k8s.as_ref();
    let pod_info = k8s.and_then(|k| k.pod_info.as_ref());

    let pod_phase = pod_info.map(|p| p.phase.clone());
    let ready = pod_info.and_then(|p| p.containers.first()).map(|c| c.ready);
    let waiting_reason = pod_info
        .and_then(|p| p.containers.iter().find_map(|c| c.waiting_reason.clone()));

    let container_waiting: Vec<ContainerWaitingSummary> = pod_info
        .map(|p| {
            p.containers
                .iter()
                .filter_map(|c| {
                    c.waiting_reason.clone().map(|reason| ContainerWaitingSummary {
                        container: c.name.clone(),
                        waiting_reason: reason,
                    })
                })
                .take(TOP_N)
                .collect()
        })
        .unwrap_or_default();

    let last_terminated: Vec<LastTerminatedSummary> = pod_info
        .map(|p| {
            p.containers
                .iter()
                .filter_map(|c| {
                    c.last_terminated.as_ref().map(|t| LastTerminatedSummary {
                        container: c.name.clone(),
                        exit_code: t.exit_code,
                        reason: t.reason.clone(),
                    })
                })
                .take(TOP_N)
                .collect()
        })
        .unwrap_or_default();

    let recent_event_reasons: Vec<String> = k8s
        .map(|k| k.pod_events.iter().map(|e| e.reason.clone()).take(TOP_N).collect())
        .unwrap_or_default();

    let restart_rate_5m_max = evidence
        .metrics
        .as_ref()
        .and_then(|m| {
            m.restarts
                .iter()
                .flat_map(|series| series.samples.iter())
                .map(|s| s.value)
                .fold(None, |max, v| Some(max.map_or(v, |m: f64| m.max(v))))
        });

    let http_5xx_rate = evidence
        .metrics
        .as_ref()
        .and_then(|m| m.http_5xx.first())
        .and_then(|series| series.samples.last())
        .map(|s| s.value);

    let throttling_ratio = if family == Family::CpuThrottling {
        compute_throttling_ratio(evidence)
    } else {
        None
    };

    let exit_code = last_terminated.first().map(|t| t.exit_code);

    Features {
        family,
        pod_phase,
        ready,
        waiting_reason,
        container_waiting,
        last_terminated,
        recent_event_reasons,
        restart_rate_5m_max,
        http_5xx_rate,
        logs_status: evidence.logs.as_ref().and_then(|l| l.status),
        probe_failure_type: k8s.and_then(|k| k.probe_failure_type),
        crash_duration_seconds: k8s.and_then(|k| k.crash_duration_seconds),
        exit_code,
        throttling_ratio,
        has_target: pod_info.is_some(),
    }
}

/// `container_cpu_cfs_throttled_periods_total /
/// container_cpu_cfs_periods_total` (SPEC_FULL §4.6 `[ADD from
/// original_source]`), read from the two CPU-usage series by label
/// convention `metric=throttled_periods` / `metric=periods`.
fn compute_throttling_ratio(evidence: &Evidence) -> Option<f64> {
    let cpu = evidence.metrics.as_ref()?;
    let throttled = cpu
        .cpu_throttling
        .iter()
        .find(|s| s.labels.get("metric").map(String::as_str) == Some("throttled_periods"))
        .and_then(|s| s.samples.last())
        .map(|s| s.value)?;
    let total = cpu
        .cpu_throttling
        .iter()
        .find(|s| s.labels.get("metric").map(String::as_str) == Some("periods"))
        .and_then(|s| s.samples.last())
        .map(|s| s.value)?;
    if total == 0.0 {
        None
    } else {
        Some(throttled / total)
    }
}

#[must_use]
pub fn is_collected(status: Option<CollectionStatus>) -> bool {
    matches!(status, Some(CollectionStatus::Ok))
}
