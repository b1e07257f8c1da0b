//! `k8s.*` and `logs.tail` (spec.md §4.4 tool table): pod/rollout/event
//! lookups and the redacted log tail, all scoped to the case's target.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{args, redaction, ToolResult};
use crate::error::ErrorCode;
use crate::pipeline::AgentContext;
use crate::providers::logs::LogsQuery;

/// Resolve `(namespace, pod)`, following the Job label-selector
/// resolution the tool table calls out for both `k8s.pod_context` and
/// `logs.tail`: when no `pod` is known, list pods by `job-name=<workload>`
/// and take the newest.
async fn resolve_namespace_and_pod(
    ctx: &AgentContext,
    call_args: &Value,
    analysis_json: &Value,
) -> Result<(String, String), ErrorCode> {
    let namespace = args::require_str(call_args, analysis_json, "namespace")?.to_string();

    if let Some(pod) = args::str_with_target_fallback(call_args, analysis_json, "pod") {
        return Ok((namespace, pod.to_string()));
    }

    let workload_name = analysis_json
        .get("target")
        .and_then(|t| t.get("workload_name"))
        .and_then(Value::as_str)
        .ok_or_else(|| ErrorCode::MissingRequiredArgs("pod".to_string()))?;

    let pods = ctx.k8s.list_pods(&namespace, &format!("job-name={workload_name}")).await?;
    let newest = pods.into_iter().max_by_key(|p| p.start_time).ok_or_else(|| {
        ErrorCode::K8sError("not_found".to_string(), Some(format!("job-name={workload_name}")))
    })?;
    Ok((namespace, newest.name))
}

pub async fn pod_context(ctx: &AgentContext, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let (namespace, pod) = match resolve_namespace_and_pod(ctx, call_args, analysis_json).await {
        Ok(pair) => pair,
        Err(err) => return ToolResult::err(err),
    };

    let pod_info = match ctx.k8s.get_pod(&namespace, &pod).await {
        Ok(info) => info,
        Err(err) => return ToolResult::err(err),
    };
    let events = ctx.k8s.list_events(&namespace, &pod).await.unwrap_or_default();

    ToolResult::ok(json!({
        "pod_info": pod_info,
        "events": events,
    }))
}

pub async fn rollout_status(ctx: &AgentContext, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let required = match args::require_all(call_args, analysis_json, &["namespace", "kind", "name"]) {
        Ok(values) => values,
        Err(err) => return ToolResult::err(err),
    };
    let (namespace, kind, name) = (required[0], required[1], required[2]);

    match ctx.k8s.get_rollout_status(namespace, kind, name).await {
        Ok(status) => ToolResult::ok(serde_json::to_value(status).unwrap_or(Value::Null)),
        Err(err) => ToolResult::err(err),
    }
}

pub async fn events(ctx: &AgentContext, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let Some(namespace) = args::str_with_target_fallback(call_args, analysis_json, "namespace") else {
        return ToolResult::err(ErrorCode::MissingRequiredArgs("namespace".to_string()));
    };
    let namespace = namespace.to_string();

    let resource_name = args::str_with_target_fallback(call_args, analysis_json, "resource_name")
        .map(str::to_string)
        .or_else(|| {
            analysis_json
                .get("target")
                .and_then(|t| t.get("pod").or_else(|| t.get("workload_name")))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    let resource_type = args::str_arg(call_args, "resource_type").unwrap_or("Pod").to_string();
    let limit = args::usize_arg(call_args, "limit").unwrap_or(20).clamp(5, 100);

    let mut entries = ctx.k8s.list_events(&namespace, &resource_name).await.unwrap_or_default();
    if entries.len() > limit {
        entries.truncate(limit);
    }

    ToolResult::ok(json!({
        "namespace": namespace,
        "resource_type": resource_type,
        "resource_name": resource_name,
        "events": entries,
    }))
}

pub async fn logs_tail(ctx: &AgentContext, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let (namespace, pod) = match resolve_namespace_and_pod(ctx, call_args, analysis_json).await {
        Ok(pair) => pair,
        Err(err) => return ToolResult::err(err),
    };
    let container = args::str_arg(call_args, "container");

    let window = analysis_json.get("window");
    let start: DateTime<Utc> = args::str_arg(call_args, "start")
        .and_then(|raw| raw.parse().ok())
        .or_else(|| window.and_then(|w| w.get("start")).and_then(Value::as_str).and_then(|s| s.parse().ok()))
        .unwrap_or_else(|| Utc::now() - chrono::Duration::hours(1));
    let end: DateTime<Utc> = args::str_arg(call_args, "end")
        .and_then(|raw| raw.parse().ok())
        .or_else(|| window.and_then(|w| w.get("end")).and_then(Value::as_str).and_then(|s| s.parse().ok()))
        .unwrap_or_else(Utc::now);

    let limit = args::usize_arg(call_args, "limit")
        .unwrap_or(ctx.chat_policy.max_log_lines)
        .min(ctx.chat_policy.max_log_lines);

    let query = LogsQuery { namespace: &namespace, pod: &pod, container, start, end, limit, regex_mode: false };
    let result = ctx.logs.fetch(&query).await;

    let redact = ctx.chat_policy.redact_secrets;
    let entries: Vec<Value> = result
        .entries
        .iter()
        .map(|entry| {
            let message = if redact { redaction::redact_secrets(&entry.message) } else { entry.message.clone() };
            json!({
                "timestamp": entry.timestamp,
                "message": message,
                "labels": entry.labels,
            })
        })
        .collect();

    ToolResult::ok(json!({
        "entries": entries,
        "status": result.status,
        "reason": result.reason,
        "backend": result.backend,
        "query_used": result.query_used,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PodInfo, RolloutStatus};
    use crate::providers::k8s::MockK8sProvider;
    use crate::providers::logs::{LogsClient, LogsClientConfig};
    use crate::providers::metrics::MockPromqlProvider;
    use crate::tools::ChatPolicy;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn base_pod(namespace: &str, name: &str) -> PodInfo {
        PodInfo {
            name: name.to_string(),
            namespace: namespace.to_string(),
            phase: "Running".to_string(),
            node_name: None,
            start_time: Some(Utc::now()),
            containers: vec![],
        }
    }

    fn ctx_with_pod(namespace: &str, name: &str) -> AgentContext {
        let mut k8s = MockK8sProvider::default();
        k8s.pods.insert((namespace.to_string(), name.to_string()), base_pod(namespace, name));
        AgentContext {
            config: crate::tools::tests_support::config(),
            k8s: Arc::new(k8s),
            metrics: Arc::new(MockPromqlProvider::default()),
            logs: LogsClient::new(LogsClientConfig::default()),
            aws: None,
            github: None,
            llm: None,
            service_catalog: scm::ServiceCatalog::default(),
            third_party_catalog: scm::ThirdPartyCatalog::default(),
            chat_policy: ChatPolicy::default(),
            modules: Vec::new(),
            playbooks: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn pod_context_resolves_pod_from_args() {
        let ctx = ctx_with_pod("ns1", "p1");
        let analysis_json = json!({"target": {}});
        let result = pod_context(&ctx, &json!({"namespace": "ns1", "pod": "p1"}), &analysis_json).await;
        assert!(result.ok);
    }

    #[tokio::test]
    async fn pod_context_falls_back_to_job_resolution() {
        let ctx = ctx_with_pod("ns1", "job1-abcde");
        let analysis_json = json!({"target": {"namespace": "ns1", "workload_name": "job1"}});
        let result = pod_context(&ctx, &json!({}), &analysis_json).await;
        assert!(result.ok);
        assert_eq!(result.result.unwrap()["pod_info"]["name"], "job1-abcde");
    }

    #[tokio::test]
    async fn missing_namespace_is_rejected() {
        let ctx = ctx_with_pod("ns1", "p1");
        let result = pod_context(&ctx, &json!({}), &json!({"target": {}})).await;
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("missing_required_args:namespace"));
    }

    #[tokio::test]
    async fn rollout_status_returns_descriptor() {
        let mut k8s = MockK8sProvider::default();
        k8s.rollout_statuses.insert(
            ("ns1".to_string(), "Deployment".to_string(), "svc".to_string()),
            RolloutStatus {
                kind: "Deployment".to_string(),
                name: "svc".to_string(),
                desired_replicas: 3,
                ready_replicas: 3,
                updated_replicas: 3,
                unavailable_replicas: 0,
            },
        );
        let ctx = AgentContext {
            config: crate::tools::tests_support::config(),
            k8s: Arc::new(k8s),
            metrics: Arc::new(MockPromqlProvider::default()),
            logs: LogsClient::new(LogsClientConfig::default()),
            aws: None,
            github: None,
            llm: None,
            service_catalog: scm::ServiceCatalog::default(),
            third_party_catalog: scm::ThirdPartyCatalog::default(),
            chat_policy: ChatPolicy::default(),
            modules: Vec::new(),
            playbooks: HashMap::new(),
        };
        let result = rollout_status(
            &ctx,
            &json!({"namespace": "ns1", "kind": "Deployment", "name": "svc"}),
            &json!({"target": {}}),
        )
        .await;
        assert!(result.ok);
        assert_eq!(result.result.unwrap()["ready_replicas"], 3);
    }

    #[tokio::test]
    async fn logs_tail_redacts_secrets_by_default() {
        // no backend configured -> empty result, but redaction path is
        // exercised independently via unit tests in redaction.rs; here we
        // only assert the tool completes and returns the expected shape.
        let ctx = ctx_with_pod("ns1", "p1");
        let result = logs_tail(&ctx, &json!({"namespace": "ns1", "pod": "p1"}), &json!({"target": {}})).await;
        assert!(result.ok);
        assert!(result.result.unwrap().get("entries").is_some());
    }
}
