//! Typed data model for the incident-investigation agent (spec.md §3).

pub mod alert;
pub mod analysis;
pub mod evidence;
pub mod investigation;
pub mod target;
pub mod window;

pub use alert::{AlertEvent, EndsAtKind, NormalizedState};
pub use analysis::{
    Analysis, CapacityAnalysis, ChangesAnalysis, Decision, EnrichmentLabel, Family,
    FamilyEnrichment, Features, Hypothesis, LlmInsights, LlmInsightsStatus, NoiseVerdict, Scores,
    Verdict,
};
pub use evidence::{
    CollectionStatus, Evidence, GithubEvidence, K8sEvidence, LogEntry, LogsBackendId,
    LogsEvidence, MetricsEvidence, OwnerChain, OwnerRef, PodCondition, PodEvent, PodInfo,
    ProbeFailureType, RolloutStatus,
};
pub use investigation::Investigation;
pub use target::{TargetRef, TargetType};
pub use window::TimeWindow;
