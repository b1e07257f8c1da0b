//! `pod_baseline` collector (spec.md §4.2): pod identity, conditions,
//! events, owner chain, rollout status, baseline metrics, and a bounded
//! log tail. The default diagnostic module for every pod-scoped family,
//! and the default playbook when no module collects anything.

use async_trait::async_trait;
use chrono::Utc;

use crate::analysis::features::is_collected;
use crate::collectors::{CollectorSlots, DiagnosticModule, Playbook};
use crate::model::evidence::{CollectionStatus, K8sEvidence, MetricsEvidence, PodCondition};
use crate::model::{Family, TargetRef};
use crate::pipeline::AgentContext;
use crate::providers::logs::LogsQuery;

pub struct PodBaselineModule;
pub struct PodBaselinePlaybook;

#[async_trait]
impl DiagnosticModule for PodBaselineModule {
    fn name(&self) -> &'static str {
        "pod_baseline"
    }

    fn applies(&self, family: Family, target: &TargetRef) -> bool {
        family.is_pod_scoped() && target.pod.is_some() && target.namespace.is_some()
    }

    async fn collect(&self, ctx: &AgentContext, target: &TargetRef) -> CollectorSlots {
        gather(ctx, target).await
    }
}

#[async_trait]
impl Playbook for PodBaselinePlaybook {
    async fn collect(&self, ctx: &AgentContext, target: &TargetRef) -> CollectorSlots {
        gather(ctx, target).await
    }
}

/// Shared gather logic for both the module and its playbook twin.
pub async fn gather(ctx: &AgentContext, target: &TargetRef) -> CollectorSlots {
    let mut slots = CollectorSlots::default();
    let (Some(namespace), Some(pod)) = (target.namespace.as_deref(), target.pod.as_deref()) else {
        slots.errors.push(("pod_baseline", "no_target".to_string()));
        return slots;
    };

    let mut k8s = K8sEvidence::default();
    let mut status = CollectionStatus::Empty;

    match ctx.k8s.get_pod(namespace, pod).await {
        Ok(pod_info) => {
            status = status.merge(CollectionStatus::Ok);
            k8s.pod_info = Some(pod_info);
        }
        Err(err) => {
            status = status.merge(CollectionStatus::Unavailable);
            slots.errors.push(("pod_baseline", err.for_subsystem("k8s")));
        }
    }

    match ctx.k8s.get_owner_chain(namespace, pod).await {
        Ok(chain) => {
            if let Some(owner) = chain.workload() {
                slots.target.workload_kind = Some(owner.kind.clone());
                slots.target.workload_name = Some(owner.name.clone());
            }
            k8s.owner_chain = Some(chain);
        }
        Err(err) => slots.errors.push(("pod_baseline", err.for_subsystem("k8s"))),
    }

    if let Some(kind) = target.workload_kind.as_deref() {
        if let Some(name) = slots.target.workload_name.as_deref().or(target.workload_name.as_deref()) {
            if let Ok(rollout) = ctx.k8s.get_rollout_status(namespace, kind, name).await {
                k8s.rollout_status = Some(rollout);
            }
        }
    }

    if let Ok(events) = ctx.k8s.list_events(namespace, pod).await {
        k8s.pod_events = events;
    }

    if let Some(pod_info) = k8s.pod_info.as_ref() {
        k8s.pod_conditions = pod_info
            .containers
            .iter()
            .map(|c| PodCondition {
                kind: c.name.clone(),
                status: if c.ready { "True".to_string() } else { "False".to_string() },
                reason: c.waiting_reason.clone(),
                message: None,
            })
            .collect();
    }

    slots.k8s = Some(k8s);

    let metrics = gather_baseline_metrics(ctx, namespace, pod).await;
    slots.metrics = Some(metrics);

    let window_end = Utc::now();
    let window_start = window_end - chrono::Duration::minutes(15);
    let query = LogsQuery {
        namespace,
        pod,
        container: target.container.as_deref(),
        start: window_start,
        end: window_end,
        limit: 200,
        regex_mode: false,
    };
    let result = ctx.logs.fetch(&query).await;
    slots.logs = Some(crate::model::evidence::LogsEvidence {
        entries: result.entries,
        status: Some(result.status),
        reason: result.reason,
        backend: result.backend,
        query_used: result.query_used,
        parsed_error_patterns: Vec::new(),
    });

    slots.succeeded = is_collected(Some(status));
    slots
}

async fn gather_baseline_metrics(ctx: &AgentContext, namespace: &str, pod: &str) -> MetricsEvidence {
    let now = Utc::now();
    let selector = format!(r#"namespace="{namespace}", pod="{pod}""#);

    let cpu_usage = ctx
        .metrics
        .instant(&format!("sum(rate(container_cpu_usage_seconds_total{{{selector}}}[5m])) by (pod)"), now)
        .await
        .unwrap_or_default();
    let memory_usage = ctx
        .metrics
        .instant(&format!("sum(container_memory_working_set_bytes{{{selector}}}) by (pod)"), now)
        .await
        .unwrap_or_default();
    let restarts = ctx
        .metrics
        .instant(&format!("max(kube_pod_container_status_restarts_total{{{selector}}}) by (pod)"), now)
        .await
        .unwrap_or_default();
    let pod_phase = ctx
        .metrics
        .instant(&format!("kube_pod_status_phase{{{selector}}}"), now)
        .await
        .unwrap_or_default();

    MetricsEvidence {
        cpu_throttling: Vec::new(),
        cpu_usage,
        memory_usage,
        restarts,
        pod_phase,
        http_5xx: Vec::new(),
    }
}
