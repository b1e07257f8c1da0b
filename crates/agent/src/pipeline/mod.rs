//! The investigation orchestrator (spec.md §4.1): one pass through
//! parse → anchor → classify → collect → enrich → analyze per alert,
//! always producing an `Investigation` (P4 totality — this function
//! never panics and never returns an error).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::analysis::{detect_family, playbook_hint};
use crate::analysis::{enrichment, features, scoring};
use crate::collectors::{self, aws_context, github_context, historical_fallback, DiagnosticModule, Playbook};
use crate::error::ErrorCode;
use crate::model::analysis::Analysis;
use crate::model::target::{ENVIRONMENT_LABEL_KEYS, TEAM_LABEL_KEYS};
use crate::model::{AlertEvent, Family, Investigation, TargetRef, TargetType};
use crate::providers::k8s::K8sProvider;
use crate::providers::llm::LlmClient;
use crate::providers::logs::{LogsClient, LogsClientConfig};
use crate::providers::metrics::PromqlProvider;
use cloud::client::AwsProvider;
use scm::{GithubProvider, ServiceCatalog, ThirdPartyCatalog};

/// Bundles every provider handle, registry, and policy an investigation
/// run reads from (spec.md §4.5, §9 "a single long-lived context
/// assembled once at process startup and shared read-only across runs").
pub struct AgentContext {
    pub config: config::AgentConfig,
    pub k8s: Arc<dyn K8sProvider>,
    pub metrics: Arc<dyn PromqlProvider>,
    pub logs: LogsClient,
    pub aws: Option<Arc<dyn AwsProvider>>,
    pub github: Option<Arc<GithubProvider>>,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub service_catalog: ServiceCatalog,
    pub third_party_catalog: ThirdPartyCatalog,
    pub chat_policy: crate::tools::ChatPolicy,
    pub modules: Vec<Box<dyn DiagnosticModule>>,
    pub playbooks: HashMap<&'static str, Box<dyn Playbook>>,
}

impl AgentContext {
    /// Assemble the default context from process configuration. Never
    /// fails outright: providers that can't be constructed (no cluster
    /// reachable, no AWS/GitHub credentials) are simply left unset and
    /// the affected evidence slots stay empty for every run.
    pub async fn from_config(config: config::AgentConfig) -> Self {
        let k8s: Arc<dyn K8sProvider> = match kube::Client::try_default().await {
            Ok(client) => Arc::new(crate::providers::k8s::KubeK8sProvider::new(client)),
            Err(err) => {
                warn!(error = %err, "k8s client unavailable, falling back to an empty mock provider");
                Arc::new(crate::providers::k8s::MockK8sProvider::default())
            }
        };

        let metrics: Arc<dyn PromqlProvider> = config
            .promql_url
            .as_deref()
            .and_then(|url| crate::providers::metrics::PrometheusProvider::new(url).ok())
            .map_or_else(
                || Arc::new(crate::providers::metrics::MockPromqlProvider::default()) as Arc<dyn PromqlProvider>,
                |provider| Arc::new(provider) as Arc<dyn PromqlProvider>,
            );

        let logs = LogsClient::new(LogsClientConfig {
            url: config.logs_url.clone(),
            backend_override: config.logs_backend.map(map_logs_backend),
            timeout: config.logs_timeout,
            in_cluster: true,
        });

        let aws: Option<Arc<dyn AwsProvider>> = if config.aws.evidence_enabled {
            Some(Arc::new(cloud::client::AwsClient::new(config.aws_region_or_default())))
        } else {
            None
        };

        let github: Option<Arc<GithubProvider>> = if config.github_evidence_enabled {
            build_github_provider(&config.github_app).map(Arc::new)
        } else {
            None
        };

        let llm: Option<Arc<dyn LlmClient>> = if config.llm.enabled {
            Some(Arc::new(crate::providers::llm::HttpLlmClient::new(config.llm.clone())))
        } else {
            None
        };

        Self {
            modules: collectors::register_default_modules(),
            playbooks: collectors::register_default_playbooks(),
            config,
            k8s,
            metrics,
            logs,
            aws,
            github,
            llm,
            service_catalog: ServiceCatalog::default(),
            third_party_catalog: ThirdPartyCatalog::default(),
            chat_policy: crate::tools::ChatPolicy::default(),
        }
    }
}

fn map_logs_backend(backend: config::LogsBackend) -> crate::model::evidence::LogsBackendId {
    match backend {
        config::LogsBackend::Loki => crate::model::evidence::LogsBackendId::Loki,
        config::LogsBackend::VictoriaLogs => crate::model::evidence::LogsBackendId::VictoriaLogs,
    }
}

fn build_github_provider(app: &config::GithubAppConfig) -> Option<GithubProvider> {
    if let (Some(app_id), Some(key), Some(installation_id)) =
        (&app.app_id, &app.private_key, &app.installation_id)
    {
        let app_id: u64 = app_id.parse().ok()?;
        let installation_id: u64 = installation_id.parse().ok()?;
        return GithubProvider::new_app(app_id, key, installation_id).ok();
    }
    GithubProvider::anonymous().ok()
}

/// Run one investigation end to end. Never panics, never returns `Err`
/// (P4): every failure at every stage is absorbed into
/// `Investigation.errors` and the run proceeds with whatever evidence
/// it could gather.
pub async fn run_investigation(ctx: &AgentContext, alert: AlertEvent, window_expr: &str) -> Investigation {
    // Stage 1-2: anchor the time window to the alert's own start time.
    let window = crate::model::window::anchor_window(window_expr, alert.starts_at, chrono::Utc::now());
    let mut investigation = Investigation::new(alert, window);

    // Stage 3: classify the alert into a family.
    let alertname = investigation.alert.alertname().to_string();
    let hint = playbook_hint(&alertname);
    let family = detect_family(&alertname, hint);

    // Stage 4: derive target identity and type from alert labels.
    derive_target(&mut investigation.target, &investigation.alert, &ctx.config);
    apply_family_scoping(&mut investigation.target, family);

    // Stage 5: run every applicable diagnostic module concurrently,
    // merge patches in registration order (sequential SSOT merge).
    let applicable: Vec<&Box<dyn DiagnosticModule>> = ctx
        .modules
        .iter()
        .filter(|m| m.applies(family, &investigation.target))
        .collect();
    let target_snapshot = investigation.target.clone();
    let module_results = join_all(applicable.iter().map(|m| m.collect(ctx, &target_snapshot))).await;
    let mut any_module_succeeded = false;
    for slots in module_results {
        any_module_succeeded |= slots.succeeded;
        slots.merge_into(&mut investigation.evidence, &mut investigation.target, &mut investigation.errors);
    }

    // Stage 6: fall back to a playbook keyed by alertname when no
    // module collected anything.
    if !any_module_succeeded {
        if let Some(playbook) = ctx.playbooks.get(alertname.as_str()) {
            let slots = playbook.collect(ctx, &investigation.target).await;
            any_module_succeeded |= slots.succeeded;
            slots.merge_into(&mut investigation.evidence, &mut investigation.target, &mut investigation.errors);
        }
    }

    // Stage 6b: K8s reports the pod as gone entirely -> historical mode.
    let pod_not_found = investigation
        .errors
        .iter()
        .any(|e| e.contains("k8s_error:not_found"));
    if pod_not_found && !any_module_succeeded {
        let (slots, historical_window) =
            historical_fallback::collect(ctx, &investigation.alert, &investigation.target).await;
        investigation.window = historical_window;
        investigation.target.target_type = TargetType::Pod;
        slots.merge_into(&mut investigation.evidence, &mut investigation.target, &mut investigation.errors);
    }

    // Stage 7: fill team/environment from alert labels if no collector
    // already promoted them.
    for key in TEAM_LABEL_KEYS {
        if let Some(value) = investigation.alert.labels.get(*key) {
            investigation.target.fill_team(value.clone());
            break;
        }
    }
    for key in ENVIRONMENT_LABEL_KEYS {
        if let Some(value) = investigation.alert.labels.get(*key) {
            investigation.target.fill_environment(value.clone());
            break;
        }
    }

    // Stage 8: optional AWS / GitHub context, gated by configuration.
    if ctx.config.aws.evidence_enabled {
        let container_images: Vec<String> = Vec::new();
        let slots = aws_context::collect(
            ctx,
            &investigation.target,
            &investigation.alert.labels,
            None,
            &container_images,
            None,
        )
        .await;
        slots.merge_into(&mut investigation.evidence, &mut investigation.target, &mut investigation.errors);
    }
    if ctx.config.github_evidence_enabled {
        if let Some(workload_name) = investigation.target.workload_name.clone() {
            let empty = HashMap::new();
            let slots = github_context::collect(ctx, &empty, &investigation.alert.labels, &workload_name).await;
            slots.merge_into(&mut investigation.evidence, &mut investigation.target, &mut investigation.errors);
        }
    }

    // Stage 9: noise classification (always), signal queries (non-pod
    // targets), change/capacity analysis (pod targets).
    let mut noise_verdict = crate::analysis::noise::analyze_noise(&investigation.alert);
    if investigation.target.target_type != TargetType::Pod {
        crate::analysis::signals::enrich_with_signal_queries(
            ctx.metrics.as_ref(),
            &investigation.alert.labels,
            &alertname,
            hint,
            &investigation.window,
            investigation.evidence.metrics_mut(),
            &mut investigation.errors,
        )
        .await;
    }
    let has_pod_target = investigation.target.target_type == TargetType::Pod
        && investigation.target.pod.is_some()
        && investigation.target.namespace.is_some();
    let changes_analysis = if has_pod_target {
        Some(crate::analysis::changes::analyze_changes(
            &investigation.window,
            investigation.evidence.github.as_ref(),
            investigation.evidence.k8s.as_ref().and_then(|k| k.rollout_status.as_ref()),
        ))
    } else {
        None
    };
    let capacity_analysis =
        if has_pod_target { Some(crate::analysis::capacity::analyze_capacity(investigation.evidence.metrics.as_ref())) } else { None };

    // Stage 10: deterministic feature/enrichment/scoring passes.
    analyze(&mut investigation, family, &mut noise_verdict, changes_analysis, capacity_analysis);

    // Stage 11: optional LLM insights layered on top of the
    // deterministic analysis.
    if let Some(llm) = ctx.llm.as_ref() {
        attach_llm_insights(&mut investigation, llm.as_ref(), &ctx.config.llm).await;
    }

    info!(
        fingerprint = %investigation.alert.fingerprint,
        family = ?family,
        errors = investigation.errors.len(),
        "investigation complete"
    );
    investigation
}

/// Alertnames whose `pod` label names the scraper/executor pod, not the
/// Job's own pod (spec.md §4.1 stage 1 "Job heuristic", P3).
const JOB_ALERT_NAMES: &[&str] = &["KubeJobFailed", "JobFailed"];

/// True when the alert matches the Job heuristic and its `pod` label
/// must be suppressed rather than copied onto the target (P3: the final
/// `target.pod` is `None` for such alerts).
fn job_pod_suppressed(alert: &AlertEvent) -> bool {
    JOB_ALERT_NAMES.contains(&alert.alertname()) && alert.label("job_name").is_some()
}

fn derive_target(target: &mut TargetRef, alert: &AlertEvent, config: &config::AgentConfig) {
    if let Some(cluster) = config.cluster_name.as_deref() {
        target.fill_cluster(cluster.to_string());
    }
    if let Some(namespace) = alert.label("namespace") {
        target.fill_namespace(namespace.to_string());
    }
    if !job_pod_suppressed(alert) {
        if let Some(pod) = alert.label("pod") {
            target.fill_pod(pod.to_string());
        }
    }
    if let Some(service) = alert.label("service") {
        target.service = Some(service.to_string());
    }
    if let Some(job) = alert.label("job") {
        target.job = Some(job.to_string());
    }
    if let Some(instance) = alert.label("instance") {
        target.instance = Some(instance.to_string());
    }
}

/// Pod-scoped families drop scrape-target metadata (it names the
/// scraper, not the incident); non-pod families drop `pod` entirely and
/// get a best-effort `target_type` (spec.md §4.1 stage 4, P3).
fn apply_family_scoping(target: &mut TargetRef, family: Family) {
    if family.is_pod_scoped() {
        target.target_type = TargetType::Pod;
        target.clear_scrape_metadata();
    } else {
        target.clear_pod();
        target.target_type = if target.service.is_some() {
            TargetType::Service
        } else if target.job.is_some() || target.instance.is_some() {
            TargetType::Node
        } else {
            TargetType::Unknown
        };
    }
}

fn analyze(
    investigation: &mut Investigation,
    family: Family,
    noise_verdict: &mut crate::model::analysis::NoiseVerdict,
    changes_analysis: Option<crate::model::analysis::ChangesAnalysis>,
    capacity_analysis: Option<crate::model::analysis::CapacityAnalysis>,
) {
    let computed = features::compute_features(family, &investigation.evidence);
    let parsed_error_patterns = investigation
        .evidence
        .logs
        .as_ref()
        .map(|l| l.parsed_error_patterns.clone())
        .unwrap_or_default();

    // Noise postprocessing can use derived features (e.g. a quiet
    // running pod), matching the original's two-pass shape.
    crate::analysis::noise::postprocess_noise(noise_verdict, &computed);

    let family_enrichment = enrichment::enrich(&computed, &parsed_error_patterns);
    let scores = scoring::compute_scores(&computed);
    let verdict = scoring::compute_verdict(&computed, &scores);
    let decision = scoring::compute_decision(&family_enrichment);
    let hypotheses = scoring::compute_hypotheses(&computed, family);

    investigation.analysis = Analysis {
        features: Some(computed),
        scores: Some(scores),
        verdict: Some(verdict),
        decision: Some(decision),
        family_enrichment: Some(family_enrichment),
        hypotheses,
        llm_insights: investigation.analysis.llm_insights.clone(),
        noise: Some(noise_verdict.clone()),
        changes: changes_analysis,
        capacity: capacity_analysis,
    };
}

async fn attach_llm_insights(
    investigation: &mut Investigation,
    llm: &dyn LlmClient,
    llm_config: &config::LlmConfig,
) {
    use crate::model::analysis::{LlmInsights, LlmInsightsStatus};

    // Prompt wording is out of scope (spec.md Non-goals); only the
    // contract (analysis JSON, optionally the log tail) matters here.
    let mut prompt = format!("incident analysis: {}", investigation.to_analysis_json());
    if llm_config.include_logs {
        if let Some(logs) = investigation.evidence.logs.as_ref() {
            let tail: Vec<&str> = logs.entries.iter().rev().take(50).map(|e| e.message.as_str()).collect();
            prompt.push_str(&format!("\nrecent logs: {}", tail.join("\n")));
        }
    }

    let (value, error) = llm.generate_json(&prompt, None, false).await;
    investigation.analysis.llm_insights = Some(match (value, error) {
        (Some(value), None) => LlmInsights {
            status: LlmInsightsStatus::Ok,
            summary: value.get("summary").and_then(|v| v.as_str()).map(str::to_string),
            error: None,
        },
        (_, Some(ErrorCode::RateLimited)) => {
            LlmInsights { status: LlmInsightsStatus::RateLimited, summary: None, error: Some("rate_limited".to_string()) }
        }
        (_, Some(err)) => LlmInsights {
            status: LlmInsightsStatus::Error,
            summary: None,
            error: Some(err.to_string()),
        },
        (None, None) => LlmInsights {
            status: LlmInsightsStatus::Unavailable,
            summary: None,
            error: None,
        },
    });
}
