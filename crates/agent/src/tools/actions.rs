//! `actions.list`, `actions.propose` (spec.md §4.4 tool table, §9 design
//! note: actions are proposed, never executed, and live only as long as
//! the process — "a single long-lived context... shared read-only
//! across runs" extends here to a process-wide proposal registry rather
//! than a per-case field threaded through `AgentContext`).

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::{json, Value};

use super::{args, ActionPolicy, ToolResult};
use crate::error::ErrorCode;
use crate::pipeline::AgentContext;

#[derive(Debug, Clone, Serialize)]
pub struct ProposedAction {
    pub id: String,
    pub action_type: String,
    pub namespace: Option<String>,
    pub cluster: Option<String>,
    pub description: String,
}

lazy_static! {
    static ref STORE: Mutex<HashMap<String, Vec<ProposedAction>>> = Mutex::new(HashMap::new());
}

/// Process-wide registry of proposed actions, keyed by case id.
pub struct ActionStore;

impl ActionStore {
    pub fn propose(case_id: &str, action: ProposedAction) {
        STORE.lock().unwrap().entry(case_id.to_string()).or_default().push(action);
    }

    #[must_use]
    pub fn list(case_id: &str) -> Vec<ProposedAction> {
        STORE.lock().unwrap().get(case_id).cloned().unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn clear(case_id: &str) {
        STORE.lock().unwrap().remove(case_id);
    }
}

pub fn list(_ctx: &AgentContext, case_id: &str) -> ToolResult {
    let actions = ActionStore::list(case_id);
    ToolResult::ok(json!({ "actions": actions }))
}

pub fn propose(
    ctx: &AgentContext,
    action_policy: &ActionPolicy,
    call_args: &Value,
    analysis_json: &Value,
    case_id: &str,
) -> ToolResult {
    let Some(action_type) = args::str_arg(call_args, "action_type") else {
        return ToolResult::err(ErrorCode::MissingRequiredArgs("action_type".to_string()));
    };
    let Some(description) = args::str_arg(call_args, "description") else {
        return ToolResult::err(ErrorCode::MissingRequiredArgs("description".to_string()));
    };

    if let Some(allowlist) = &action_policy.action_type_allowlist {
        if !allowlist.iter().any(|a| a == action_type) {
            return ToolResult::err(ErrorCode::ToolNotAllowed);
        }
    }

    let namespace = args::str_with_target_fallback(call_args, analysis_json, "namespace").map(str::to_string);
    let cluster = args::str_with_target_fallback(call_args, analysis_json, "cluster").map(str::to_string);
    if let Some(allowlist) = &action_policy.namespace_allowlist {
        let ns = namespace.as_deref().unwrap_or("");
        if !allowlist.iter().any(|a| a == ns) {
            return ToolResult::err(ErrorCode::NamespaceNotAllowed(ns.to_string()));
        }
    }
    if let Some(allowlist) = &action_policy.cluster_allowlist {
        let cl = cluster.as_deref().unwrap_or("");
        if !allowlist.iter().any(|a| a == cl) {
            return ToolResult::err(ErrorCode::ClusterNotAllowed(cl.to_string()));
        }
    }

    if ActionStore::list(case_id).len() >= action_policy.max_actions_per_case {
        return ToolResult::err(ErrorCode::CaseActionLimitReached);
    }

    let action = ProposedAction {
        id: format!("act-{}", uuid::Uuid::new_v4()),
        action_type: action_type.to_string(),
        namespace,
        cluster,
        description: description.to_string(),
    };
    let _ = ctx;
    ActionStore::propose(case_id, action.clone());
    ToolResult::ok(json!({ "action": action }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::k8s::MockK8sProvider;
    use crate::providers::logs::{LogsClient, LogsClientConfig};
    use crate::providers::metrics::MockPromqlProvider;
    use crate::tools::ChatPolicy;
    use std::sync::Arc;

    fn ctx() -> AgentContext {
        AgentContext {
            config: crate::tools::tests_support::config(),
            k8s: Arc::new(MockK8sProvider::default()),
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

    #[test]
    fn propose_requires_action_type_and_description() {
        ActionStore::clear("case-actions-1");
        let ctx = ctx();
        let policy = ActionPolicy { enabled: true, max_actions_per_case: 5, ..ActionPolicy::default() };
        let result = propose(&ctx, &policy, &json!({}), &json!({}), "case-actions-1");
        assert_eq!(result.error.as_deref(), Some("missing_required_args:action_type"));
    }

    #[test]
    fn s6_case_action_limit_is_enforced() {
        ActionStore::clear("case-actions-2");
        let ctx = ctx();
        let policy = ActionPolicy { enabled: true, max_actions_per_case: 1, ..ActionPolicy::default() };
        let args = json!({"action_type": "restart_pod", "description": "restart the crashing pod"});
        let first = propose(&ctx, &policy, &args, &json!({}), "case-actions-2");
        assert!(first.ok);
        let second = propose(&ctx, &policy, &args, &json!({}), "case-actions-2");
        assert_eq!(second.error.as_deref(), Some("case_action_limit_reached"));
    }

    #[test]
    fn action_type_outside_allowlist_is_rejected() {
        ActionStore::clear("case-actions-3");
        let ctx = ctx();
        let policy = ActionPolicy {
            enabled: true,
            action_type_allowlist: Some(vec!["restart_pod".to_string()]),
            max_actions_per_case: 5,
            ..ActionPolicy::default()
        };
        let args = json!({"action_type": "scale_down", "description": "scale down the deployment"});
        let result = propose(&ctx, &policy, &args, &json!({}), "case-actions-3");
        assert_eq!(result.error.as_deref(), Some("tool_not_allowed"));
    }

    #[test]
    fn list_returns_previously_proposed_actions() {
        ActionStore::clear("case-actions-4");
        let ctx = ctx();
        let policy = ActionPolicy { enabled: true, max_actions_per_case: 5, ..ActionPolicy::default() };
        let args = json!({"action_type": "restart_pod", "description": "restart the crashing pod"});
        propose(&ctx, &policy, &args, &json!({}), "case-actions-4");
        let result = list(&ctx, "case-actions-4");
        assert_eq!(result.result.unwrap()["actions"].as_array().unwrap().len(), 1);
    }
}
