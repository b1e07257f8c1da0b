//! The chat tool runtime (spec.md §4.4): a single `dispatch` entry point
//! gating every tool behind `ChatPolicy`/`ActionPolicy`, with uniform
//! preflight, compaction, and redaction around each handler.

mod actions;
mod args;
mod aws_tools;
mod compaction;
mod github_tools;
mod k8s_tools;
mod memory_tools;
mod policy;
mod promql_tools;
mod redaction;
mod rerun;

pub use actions::ActionStore;
pub use policy::{check_scope, requires_scope_check, ActionPolicy, ChatPolicy, SCOPE_CHECKED_PREFIXES};
pub use redaction::redact_secrets;

use serde_json::Value;

use crate::error::ErrorCode;
use crate::pipeline::AgentContext;

/// `ToolResult` (spec.md §4.4): every dispatch call returns exactly this
/// shape, whether the tool succeeded, was denied, or failed outright.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolResult {
    pub ok: bool,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub updated_analysis: Option<Value>,
}

impl ToolResult {
    #[must_use]
    pub fn ok(result: Value) -> Self {
        Self { ok: true, result: Some(result), error: None, updated_analysis: None }
    }

    #[must_use]
    pub fn updated(analysis: Value) -> Self {
        Self { ok: true, result: None, error: None, updated_analysis: Some(analysis) }
    }

    #[must_use]
    pub fn err(code: ErrorCode) -> Self {
        Self { ok: false, result: None, error: Some(code.to_string()), updated_analysis: None }
    }
}

/// Capability flag a tool name is gated behind, or `None` for tools the
/// capability table doesn't cover (treated as `unknown_tool`).
fn required_capability(tool_name: &str) -> Option<fn(&ChatPolicy) -> bool> {
    match tool_name {
        "promql.instant" => Some(|p| p.allow_promql),
        "k8s.events" => Some(|p| p.allow_k8s_events),
        "k8s.pod_context" | "k8s.rollout_status" => Some(|p| p.allow_k8s_read),
        "logs.tail" => Some(|p| p.allow_logs_query),
        "memory.similar_cases" | "memory.skills" => Some(|p| p.allow_memory_read),
        "rerun.investigation" => Some(|p| p.allow_report_rerun),
        name if name.starts_with("aws.") => Some(|p| p.allow_aws_read),
        name if name.starts_with("github.") => Some(|p| p.allow_github_read),
        _ => None,
    }
}

fn target_namespace_cluster(analysis_json: &Value) -> (Option<&str>, Option<&str>) {
    let target = analysis_json.get("target");
    let namespace = target.and_then(|t| t.get("namespace")).and_then(Value::as_str);
    let cluster = target.and_then(|t| t.get("cluster")).and_then(Value::as_str);
    (namespace, cluster)
}

/// Preflight + route a single tool call (spec.md §4.4). Never panics:
/// every failure path, including an unrecognized tool name, is returned
/// as a `ToolResult{ok:false}` rather than propagated.
pub async fn dispatch(
    ctx: &AgentContext,
    action_policy: &ActionPolicy,
    tool_name: &str,
    args: Value,
    analysis_json: &Value,
    case_id: &str,
) -> ToolResult {
    let Some(capability) = required_capability(tool_name).or_else(|| {
        (tool_name.starts_with("actions.")).then_some((|_: &ChatPolicy| true) as fn(&ChatPolicy) -> bool)
    }) else {
        return ToolResult::err(ErrorCode::UnknownTool);
    };

    if requires_scope_check(tool_name) {
        let (namespace, cluster) = target_namespace_cluster(analysis_json);
        if let Err(err) = check_scope(&ctx.chat_policy, namespace, cluster) {
            return ToolResult::err(err);
        }
    }

    if tool_name.starts_with("actions.") {
        if !action_policy.enabled {
            return ToolResult::err(ErrorCode::ToolNotAllowed);
        }
    } else if !capability(&ctx.chat_policy) {
        return ToolResult::err(ErrorCode::ToolNotAllowed);
    }

    let result = route(ctx, action_policy, tool_name, &args, analysis_json, case_id).await;
    compaction::compact_tool_result(result)
}

async fn route(
    ctx: &AgentContext,
    action_policy: &ActionPolicy,
    tool_name: &str,
    args: &Value,
    analysis_json: &Value,
    case_id: &str,
) -> ToolResult {
    match tool_name {
        "promql.instant" => promql_tools::instant(ctx, args).await,
        "k8s.pod_context" => k8s_tools::pod_context(ctx, args, analysis_json).await,
        "k8s.rollout_status" => k8s_tools::rollout_status(ctx, args, analysis_json).await,
        "k8s.events" => k8s_tools::events(ctx, args, analysis_json).await,
        "logs.tail" => k8s_tools::logs_tail(ctx, args, analysis_json).await,
        "memory.similar_cases" => memory_tools::similar_cases(args),
        "memory.skills" => memory_tools::skills(args),
        "actions.list" => actions::list(ctx, case_id),
        "actions.propose" => actions::propose(ctx, action_policy, args, analysis_json, case_id),
        "rerun.investigation" => rerun::investigation(ctx, args, analysis_json).await,
        name if name.starts_with("aws.") => aws_tools::dispatch(ctx, name, args, analysis_json).await,
        name if name.starts_with("github.") => github_tools::dispatch(ctx, name, args, analysis_json).await,
        _ => ToolResult::err(ErrorCode::UnknownTool),
    }
}
