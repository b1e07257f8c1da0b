//! `github_context` collector (spec.md §4.2): runs the eight-step repo
//! discovery chain, then pulls recent commits/workflow runs/README/docs
//! from the discovered repo. Third-party repos (outside the configured
//! org) only get README/docs — never commits or workflow logs.

use std::collections::HashMap;

use scm::{discover_repo, DiscoveryInput, DiscoveryMethod};

use crate::collectors::CollectorSlots;
use crate::model::evidence::GithubEvidence;
use crate::pipeline::AgentContext;

const RECENT_COMMITS_LIMIT: u8 = 10;
const WORKFLOW_RUNS_LIMIT: usize = 5;

pub async fn collect(
    ctx: &AgentContext,
    workload_annotations: &HashMap<String, String>,
    alert_labels: &HashMap<String, String>,
    workload_name: &str,
) -> CollectorSlots {
    let mut slots = CollectorSlots::default();

    let Some(github) = ctx.github.as_ref() else {
        slots.errors.push(("github_context", "not_configured".to_string()));
        return slots;
    };

    let input = DiscoveryInput {
        workload_annotations,
        alert_labels,
        workload_name,
        user_catalog: &ctx.service_catalog,
        third_party_catalog: &ctx.third_party_catalog,
        default_org: ctx.config.github_app.default_org.as_deref(),
        org_annotation_prefix: "github.com",
    };
    let discovery = discover_repo(&input, github.as_ref()).await;

    let Some(repo) = discovery.repo else {
        slots.errors.push(("github_context", "repo_not_discovered".to_string()));
        return slots;
    };

    let is_third_party = match discovery.method {
        DiscoveryMethod::ThirdPartyCatalog => true,
        _ => ctx
            .config
            .github_app
            .default_org
            .as_deref()
            .is_some_and(|org| !org.eq_ignore_ascii_case(&repo.org)),
    };

    let mut evidence = GithubEvidence {
        repo: Some(repo.full()),
        discovery_method: format!("{:?}", discovery.method),
        is_third_party,
        recent_commits: Vec::new(),
        workflow_runs: Vec::new(),
        failed_workflow_logs: Vec::new(),
        readme: None,
        docs: Vec::new(),
    };

    if !is_third_party {
        match github.recent_commits(&repo.org, &repo.name, RECENT_COMMITS_LIMIT).await {
            Ok(commits) => evidence.recent_commits = commits,
            Err(err) => slots.errors.push(("github_context", err.code())),
        }

        match github.workflow_runs(&repo.org, &repo.name, WORKFLOW_RUNS_LIMIT).await {
            Ok(runs) => {
                let failed_ids: Vec<u64> = runs
                    .iter()
                    .filter(|r| r.conclusion.as_deref() == Some("failure"))
                    .map(|r| r.id)
                    .collect();
                evidence.workflow_runs = runs;
                for id in failed_ids {
                    if let Ok(log) = github.failed_workflow_job_log(&repo.org, &repo.name, id).await {
                        evidence.failed_workflow_logs.push(log);
                    }
                }
            }
            Err(err) => slots.errors.push(("github_context", err.code())),
        }
    }

    match github.readme(&repo.org, &repo.name).await {
        Ok(readme) => evidence.readme = readme,
        Err(err) => slots.errors.push(("github_context", err.code())),
    }
    match github.docs(&repo.org, &repo.name).await {
        Ok(docs) => evidence.docs = docs,
        Err(err) => slots.errors.push(("github_context", err.code())),
    }

    slots.succeeded = true;
    slots.github = Some(evidence);
    slots
}
