//! `github.*` (spec.md §4.4 tool table): `repo` resolves via the §4.2
//! discovery chain when missing or malformed, retrying with the K8s
//! suffix stripped from the repo name-part.

use serde_json::{json, Value};

use super::{args, ToolResult};
use crate::error::ErrorCode;
use crate::pipeline::AgentContext;
use scm::clean::strip_known_suffix;
use scm::discovery::{discover_repo, DiscoveryInput, RepoRef};

/// Resolve `(org, repo)` from `args.repo`, retrying with the K8s suffix
/// stripped, else falling back to discovery keyed on `target.workload_name`.
async fn resolve_repo(
    ctx: &AgentContext,
    call_args: &Value,
    analysis_json: &Value,
) -> Result<RepoRef, ErrorCode> {
    if let Some(raw) = args::str_arg(call_args, "repo") {
        if let Some(repo) = RepoRef::parse(raw) {
            return Ok(repo);
        }
        if let Some(stripped) = strip_known_suffix(raw) {
            if let Some(repo) = RepoRef::parse(stripped) {
                return Ok(repo);
            }
        }
    }

    let workload_name = analysis_json
        .get("target")
        .and_then(|t| t.get("workload_name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let Some(github) = ctx.github.as_ref() else {
        return Err(ErrorCode::RepoNotDiscovered);
    };
    let input = DiscoveryInput {
        workload_annotations: &std::collections::HashMap::new(),
        alert_labels: &std::collections::HashMap::new(),
        workload_name,
        user_catalog: &ctx.service_catalog,
        third_party_catalog: &ctx.third_party_catalog,
        default_org: ctx.config.github_app.default_org.as_deref(),
        org_annotation_prefix: "github.com",
    };
    let result = discover_repo(&input, github.as_ref()).await;
    result.repo.ok_or(ErrorCode::RepoNotDiscovered)
}

fn check_repo_allowlist(ctx: &AgentContext, repo: &RepoRef) -> Result<(), ErrorCode> {
    if let Some(allowlist) = &ctx.chat_policy.github_repo_allowlist {
        let full = repo.full();
        if !allowlist.iter().any(|r| *r == full) {
            return Err(ErrorCode::RepoNotAllowed(full));
        }
    }
    Ok(())
}

pub async fn dispatch(ctx: &AgentContext, tool_name: &str, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let Some(github) = ctx.github.as_ref() else {
        return ToolResult::err(ErrorCode::NotConfigured);
    };
    let repo = match resolve_repo(ctx, call_args, analysis_json).await {
        Ok(repo) => repo,
        Err(err) => return ToolResult::err(err),
    };
    if let Err(err) = check_repo_allowlist(ctx, &repo) {
        return ToolResult::err(err);
    }

    match tool_name {
        "github.commits" => {
            let limit = args::u64_arg(call_args, "limit").unwrap_or(10).clamp(1, 100) as u8;
            match github.recent_commits(&repo.org, &repo.name, limit).await {
                Ok(commits) => ToolResult::ok(json!({ "commits": commits })),
                Err(err) => ToolResult::err(ErrorCode::GithubError(err.to_string())),
            }
        }
        "github.workflow_runs" => {
            let limit = args::usize_arg(call_args, "limit").unwrap_or(10);
            match github.workflow_runs(&repo.org, &repo.name, limit).await {
                Ok(runs) => ToolResult::ok(json!({ "workflow_runs": runs })),
                Err(err) => ToolResult::err(ErrorCode::GithubError(err.to_string())),
            }
        }
        "github.failed_workflow_logs" => {
            let Some(job_id) = args::u64_arg(call_args, "job_id") else {
                return ToolResult::err(ErrorCode::MissingRequiredArgs("job_id".to_string()));
            };
            match github.failed_workflow_job_log(&repo.org, &repo.name, job_id).await {
                Ok(log) => ToolResult::ok(json!({ "log": log })),
                Err(err) => ToolResult::err(ErrorCode::GithubError(err.to_string())),
            }
        }
        "github.readme" => match github.readme(&repo.org, &repo.name).await {
            Ok(readme) => ToolResult::ok(json!({ "readme": readme })),
            Err(err) => ToolResult::err(ErrorCode::GithubError(err.to_string())),
        },
        "github.docs" => match github.docs(&repo.org, &repo.name).await {
            Ok(docs) => ToolResult::ok(json!({ "docs": docs })),
            Err(err) => ToolResult::err(ErrorCode::GithubError(err.to_string())),
        },
        _ => ToolResult::err(ErrorCode::UnknownTool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::k8s::MockK8sProvider;
    use crate::providers::logs::{LogsClient, LogsClientConfig};
    use crate::providers::metrics::MockPromqlProvider;
    use crate::tools::ChatPolicy;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ctx_without_github() -> AgentContext {
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

    #[tokio::test]
    async fn unconfigured_github_yields_not_configured() {
        let ctx = ctx_without_github();
        let result = dispatch(&ctx, "github.commits", &json!({"repo": "myorg/repo"}), &json!({})).await;
        assert_eq!(result.error.as_deref(), Some("not_configured"));
    }

    #[test]
    fn repo_allowlist_rejects_repo_outside_list() {
        let mut ctx = ctx_without_github();
        ctx.chat_policy.github_repo_allowlist = Some(vec!["myorg/allowed".to_string()]);
        let repo = RepoRef::parse("myorg/other").unwrap();
        let result = check_repo_allowlist(&ctx, &repo);
        assert_eq!(result.unwrap_err().to_string(), "repo_not_allowed:myorg/other");
    }
}
