//! `Analysis` (spec.md §3, §4.6): the deterministic output of the pure
//! analysis passes over a filled `Evidence` record.

use serde::Serialize;

use super::evidence::{CollectionStatus, ProbeFailureType};

/// The closed family taxonomy (spec.md §4.1 stage 3). `I5`: set exactly
/// once, before collectors run, and never mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Crashloop,
    CpuThrottling,
    PodNotHealthy,
    Http5xx,
    OomKilled,
    MemoryPressure,
    TargetDown,
    JobFailed,
    K8sRolloutHealth,
    ObservabilityPipeline,
    Meta,
    Generic,
}

impl Family {
    #[must_use]
    pub fn is_pod_scoped(self) -> bool {
        !matches!(
            self,
            Self::TargetDown | Self::K8sRolloutHealth | Self::ObservabilityPipeline | Self::Meta
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContainerWaitingSummary {
    pub container: String,
    pub waiting_reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LastTerminatedSummary {
    pub container: String,
    pub exit_code: i32,
    pub reason: Option<String>,
}

/// Derived features, consumed by enrichment, scoring, and verdict
/// (spec.md §4.6).
#[derive(Debug, Clone, Serialize)]
pub struct Features {
    pub family: Family,
    pub pod_phase: Option<String>,
    pub ready: Option<bool>,
    pub waiting_reason: Option<String>,
    pub container_waiting: Vec<ContainerWaitingSummary>,
    pub last_terminated: Vec<LastTerminatedSummary>,
    pub recent_event_reasons: Vec<String>,
    pub restart_rate_5m_max: Option<f64>,
    pub http_5xx_rate: Option<f64>,
    pub logs_status: Option<CollectionStatus>,
    pub probe_failure_type: Option<ProbeFailureType>,
    pub crash_duration_seconds: Option<f64>,
    pub exit_code: Option<i32>,
    /// `cpu_throttling` only (SPEC_FULL §4.6 `[ADD from original_source]`):
    /// `container_cpu_cfs_throttled_periods_total /
    /// container_cpu_cfs_periods_total`.
    pub throttling_ratio: Option<f64>,
    pub has_target: bool,
}

/// Family-specific enrichment label (spec.md §4.6 crashloop table, plus
/// the generic fallback used by other families).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentLabel {
    SuspectedOomCrash,
    SuspectedLivenessProbeFailure,
    SuspectedDependencyUnavailable,
    SuspectedConfigOrPermissionError,
    SuspectedAppStartupFailure,
    SuspectedAppRuntimeFailure,
    UnknownNeedsHuman,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyEnrichment {
    pub label: EnrichmentLabel,
    pub why: Vec<String>,
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hypothesis {
    pub description: String,
    pub confidence: f64,
    pub suggested_tests: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scores {
    /// `[0, 100]`.
    pub impact_score: f64,
    /// `[0, 100]`.
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub classification: String,
    pub one_liner: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub label: String,
    pub why: Vec<String>,
    pub next_steps: Vec<String>,
}

/// `LLMInsights.status` (spec.md §7 error-classification table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmInsightsStatus {
    Ok,
    Unavailable,
    RateLimited,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmInsights {
    pub status: LlmInsightsStatus,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Noise classification (spec.md §4.1 stage 9): computed for every
/// alert, pod-scoped or not. SPEC_FULL §9 Open Question: the concrete
/// heuristic is this implementation's own choice (see DESIGN.md) since
/// `original_source/agent/pipeline/noise.py` was not part of the
/// retrieved source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NoiseVerdict {
    pub is_noise: bool,
    pub reason: Option<String>,
}

/// Recent-change correlation (spec.md §4.1 stage 9, pod targets only).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangesAnalysis {
    pub recent_deploy_suspected: bool,
    pub commits_in_window: usize,
    pub notes: Vec<String>,
}

/// Capacity analysis (spec.md §4.1 stage 9, pod targets only).
#[derive(Debug, Clone, Default, Serialize)]
pub struct CapacityAnalysis {
    pub cpu_utilization_ratio: Option<f64>,
    pub memory_utilization_ratio: Option<f64>,
    pub near_limit: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    pub features: Option<Features>,
    pub scores: Option<Scores>,
    pub verdict: Option<Verdict>,
    pub decision: Option<Decision>,
    pub family_enrichment: Option<FamilyEnrichment>,
    pub hypotheses: Vec<Hypothesis>,
    pub llm_insights: Option<LlmInsights>,
    pub noise: Option<NoiseVerdict>,
    pub changes: Option<ChangesAnalysis>,
    pub capacity: Option<CapacityAnalysis>,
}
