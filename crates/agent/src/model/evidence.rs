//! `Evidence` (spec.md §3): independent, optional evidence slots, one
//! per subsystem. Each slot is written by exactly one collector
//! (glossary: "evidence slot").

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cloud::AwsEvidence;
use serde::Serialize;

/// Collection status shared by every slot that can be "attempted but
/// empty/unavailable" (spec.md §3, I1/P5 monotonicity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Ok,
    Empty,
    Unavailable,
}

impl CollectionStatus {
    /// Rank used to enforce monotonicity (I1): `Ok` never regresses.
    fn rank(self) -> u8 {
        match self {
            Self::Unavailable => 0,
            Self::Empty => 1,
            Self::Ok => 2,
        }
    }

    /// Merge a newly observed status with the current one, refusing to
    /// downgrade away from `Ok` (P5).
    #[must_use]
    pub fn merge(self, incoming: Self) -> Self {
        if incoming.rank() >= self.rank() {
            incoming
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub labels: HashMap<String, String>,
}

/// Dual-dialect backend identity (spec.md §4.3 glossary "Backend").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogsBackendId {
    Loki,
    VictoriaLogs,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogsEvidence {
    pub entries: Vec<LogEntry>,
    pub status: Option<CollectionStatus>,
    pub reason: Option<String>,
    pub backend: Option<LogsBackendId>,
    pub query_used: Option<String>,
    /// Parsed error-message patterns (e.g. "ECONNREFUSED") scanned out
    /// of the tail, consumed by family enrichment (spec.md §4.6 table).
    pub parsed_error_patterns: Vec<String>,
}

impl LogsEvidence {
    /// I1/I3: never downgrade a status once set, and always carry the
    /// backend identity once anything is attempted.
    pub fn record(&mut self, status: CollectionStatus, backend: LogsBackendId) {
        self.status = Some(self.status.unwrap_or(status).merge(status));
        self.backend.get_or_insert(backend);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PodCondition {
    pub kind: String,
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PodEvent {
    pub reason: String,
    pub message: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub count: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerLastTerminated {
    pub exit_code: i32,
    pub reason: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
    pub waiting_reason: Option<String>,
    pub last_terminated: Option<ContainerLastTerminated>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub phase: String,
    pub node_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub containers: Vec<ContainerStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerRef {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OwnerChain {
    /// Root-first: pod -> replicaset -> deployment, etc.
    pub chain: Vec<OwnerRef>,
    pub labels: HashMap<String, String>,
}

impl OwnerChain {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Highest-level owner, conventionally the workload (spec.md §4.1
    /// stage 7).
    #[must_use]
    pub fn workload(&self) -> Option<&OwnerRef> {
        self.chain.last()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RolloutStatus {
    pub kind: String,
    pub name: String,
    pub desired_replicas: i32,
    pub ready_replicas: i32,
    pub updated_replicas: i32,
    pub unavailable_replicas: i32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct K8sEvidence {
    pub pod_info: Option<PodInfo>,
    pub pod_conditions: Vec<PodCondition>,
    pub pod_events: Vec<PodEvent>,
    pub owner_chain: Option<OwnerChain>,
    pub rollout_status: Option<RolloutStatus>,

    // crashloop-specific fields (spec.md §4.2 "Crashloop").
    pub previous_container_logs: Option<Vec<String>>,
    pub probe_failure_type: Option<ProbeFailureType>,
    pub crash_duration_seconds: Option<f64>,

    // historical-fallback fields (spec.md §4.2 "Historical fallback").
    pub historical_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeFailureType {
    Liveness,
    Readiness,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricSample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelledSeries {
    pub labels: HashMap<String, String>,
    pub samples: Vec<MetricSample>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsEvidence {
    pub cpu_throttling: Vec<LabelledSeries>,
    pub cpu_usage: Vec<LabelledSeries>,
    pub memory_usage: Vec<LabelledSeries>,
    pub restarts: Vec<LabelledSeries>,
    pub pod_phase: Vec<LabelledSeries>,
    pub http_5xx: Vec<LabelledSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GithubEvidence {
    pub repo: Option<String>,
    pub discovery_method: String,
    pub is_third_party: bool,
    pub recent_commits: Vec<scm::github::Commit>,
    pub workflow_runs: Vec<scm::github::WorkflowRun>,
    pub failed_workflow_logs: Vec<String>,
    pub readme: Option<String>,
    pub docs: Vec<scm::github::DocFile>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Evidence {
    pub logs: Option<LogsEvidence>,
    pub k8s: Option<K8sEvidence>,
    pub metrics: Option<MetricsEvidence>,
    pub aws: Option<AwsEvidence>,
    pub github: Option<GithubEvidence>,
}

impl Evidence {
    pub fn k8s_mut(&mut self) -> &mut K8sEvidence {
        self.k8s.get_or_insert_with(K8sEvidence::default)
    }

    pub fn metrics_mut(&mut self) -> &mut MetricsEvidence {
        self.metrics.get_or_insert_with(MetricsEvidence::default)
    }

    pub fn logs_mut(&mut self) -> &mut LogsEvidence {
        self.logs.get_or_insert_with(LogsEvidence::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p5_status_never_downgrades_from_ok() {
        let mut logs = LogsEvidence::default();
        logs.record(CollectionStatus::Ok, LogsBackendId::Loki);
        logs.record(CollectionStatus::Empty, LogsBackendId::Loki);
        assert_eq!(logs.status, Some(CollectionStatus::Ok));
    }

    #[test]
    fn i3_backend_identity_is_sticky_once_attempted() {
        let mut logs = LogsEvidence::default();
        logs.record(CollectionStatus::Empty, LogsBackendId::VictoriaLogs);
        logs.record(CollectionStatus::Empty, LogsBackendId::Loki);
        assert_eq!(logs.backend, Some(LogsBackendId::VictoriaLogs));
    }
}
