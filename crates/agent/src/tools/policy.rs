//! `ChatPolicy` / `ActionPolicy` (spec.md §4.4): the capability set a
//! chat session is granted. Every tool consults the policy before
//! executing (glossary "Policy").

use crate::error::ErrorCode;

/// Capability flags and bounds for the chat tool runtime.
#[derive(Debug, Clone)]
pub struct ChatPolicy {
    pub allow_promql: bool,
    pub allow_k8s_read: bool,
    pub allow_k8s_events: bool,
    pub allow_logs_query: bool,
    pub allow_aws_read: bool,
    pub allow_github_read: bool,
    pub allow_memory_read: bool,
    pub allow_report_rerun: bool,
    pub allow_argocd_read: bool,
    pub redact_secrets: bool,
    pub namespace_allowlist: Option<Vec<String>>,
    pub cluster_allowlist: Option<Vec<String>>,
    pub aws_region_allowlist: Option<Vec<String>>,
    pub github_repo_allowlist: Option<Vec<String>>,
    pub max_log_lines: usize,
    pub max_promql_series: usize,
    pub max_time_window_seconds: i64,
    pub max_steps: usize,
    pub max_tool_calls: usize,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            allow_promql: true,
            allow_k8s_read: true,
            allow_k8s_events: true,
            allow_logs_query: true,
            allow_aws_read: false,
            allow_github_read: false,
            allow_memory_read: true,
            allow_report_rerun: true,
            allow_argocd_read: false,
            redact_secrets: true,
            namespace_allowlist: None,
            cluster_allowlist: None,
            aws_region_allowlist: None,
            github_repo_allowlist: None,
            max_log_lines: 500,
            max_promql_series: 50,
            max_time_window_seconds: 24 * 3600,
            max_steps: 12,
            max_tool_calls: 20,
        }
    }
}

/// Capability flags and bounds for the action-proposal surface.
#[derive(Debug, Clone, Default)]
pub struct ActionPolicy {
    pub enabled: bool,
    pub namespace_allowlist: Option<Vec<String>>,
    pub cluster_allowlist: Option<Vec<String>>,
    pub action_type_allowlist: Option<Vec<String>>,
    pub max_actions_per_case: usize,
}

/// Tool-name prefixes that must be scope-checked against
/// `namespace_allowlist`/`cluster_allowlist` (spec.md §4.4 preflight, P9).
pub const SCOPE_CHECKED_PREFIXES: &[&str] = &["k8s.", "logs.", "rerun.", "memory."];

#[must_use]
pub fn requires_scope_check(tool_name: &str) -> bool {
    SCOPE_CHECKED_PREFIXES.iter().any(|p| tool_name.starts_with(p))
}

/// Enforce `namespace_allowlist`/`cluster_allowlist` against the
/// target's namespace/cluster (spec.md §4.4 preflight, P9).
pub fn check_scope(
    policy: &ChatPolicy,
    namespace: Option<&str>,
    cluster: Option<&str>,
) -> Result<(), ErrorCode> {
    if let Some(allowlist) = &policy.namespace_allowlist {
        let ns = namespace.unwrap_or("");
        if !allowlist.iter().any(|a| a == ns) {
            return Err(ErrorCode::NamespaceNotAllowed(ns.to_string()));
        }
    }
    if let Some(allowlist) = &policy.cluster_allowlist {
        let cl = cluster.unwrap_or("");
        if !allowlist.iter().any(|a| a == cl) {
            return Err(ErrorCode::ClusterNotAllowed(cl.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_checked_prefixes_cover_named_families() {
        assert!(requires_scope_check("k8s.pod_context"));
        assert!(requires_scope_check("logs.tail"));
        assert!(requires_scope_check("rerun.investigation"));
        assert!(requires_scope_check("memory.similar_cases"));
        assert!(!requires_scope_check("promql.instant"));
        assert!(!requires_scope_check("aws.describe_instances"));
    }

    #[test]
    fn p9_namespace_not_allowed_when_outside_allowlist() {
        let policy = ChatPolicy {
            namespace_allowlist: Some(vec!["prod".to_string()]),
            ..ChatPolicy::default()
        };
        let result = check_scope(&policy, Some("staging"), None);
        assert_eq!(result.unwrap_err().to_string(), "namespace_not_allowed:staging");
    }

    #[test]
    fn p9_cluster_not_allowed_when_outside_allowlist() {
        let policy = ChatPolicy {
            cluster_allowlist: Some(vec!["us-east".to_string()]),
            ..ChatPolicy::default()
        };
        let result = check_scope(&policy, None, Some("eu-west"));
        assert_eq!(result.unwrap_err().to_string(), "cluster_not_allowed:eu-west");
    }

    #[test]
    fn scope_passes_when_no_allowlist_configured() {
        let policy = ChatPolicy::default();
        assert!(check_scope(&policy, Some("anything"), Some("anything")).is_ok());
    }
}
