//! Dual-dialect logs client (spec.md §4.3): a single `fetch` operation
//! over either Loki or VictoriaLogs, with a shared fallback ladder and
//! newest-N result shaping.

pub mod heap;
pub mod loki;
pub mod victorialogs;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::model::{CollectionStatus, LogEntry, LogsBackendId};
use heap::NewestN;

/// Process-local default, tried only when no `LOGS_URL` is configured
/// and the process is running outside a cluster (spec.md §4.3).
const DEFAULT_LOCAL_VICTORIALOGS_URL: &str = "http://localhost:9428";

#[derive(Debug, Clone)]
pub struct LogsClientConfig {
    pub url: Option<String>,
    pub backend_override: Option<LogsBackendId>,
    pub timeout: Duration,
    pub in_cluster: bool,
}

impl Default for LogsClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            backend_override: None,
            timeout: Duration::from_secs(10),
            in_cluster: true,
        }
    }
}

pub struct LogsQuery<'a> {
    pub namespace: &'a str,
    pub pod: &'a str,
    pub container: Option<&'a str>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub limit: usize,
    pub regex_mode: bool,
}

#[derive(Debug, Clone)]
pub struct LogsResult {
    pub entries: Vec<LogEntry>,
    pub status: CollectionStatus,
    pub reason: Option<String>,
    pub backend: Option<LogsBackendId>,
    pub query_used: Option<String>,
}

pub struct LogsClient {
    http: reqwest::Client,
    config: LogsClientConfig,
}

/// A single fallback-ladder label set: `(labels, dialect restriction)`.
/// `None` dialect restriction means the attempt applies to both.
struct LadderStep {
    label_keys: (&'static str, &'static str),
    loki_only: bool,
}

const LADDER: &[LadderStep] = &[
    LadderStep { label_keys: ("namespace", "pod"), loki_only: false },
    LadderStep { label_keys: ("k8s_namespace", "k8s_pod"), loki_only: false },
    LadderStep { label_keys: ("namespace", "pod_name"), loki_only: true },
];

impl LogsClient {
    #[must_use]
    pub fn new(config: LogsClientConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("reqwest client construction with static config cannot fail");
        Self { http, config }
    }

    /// Resolve `(backend, base_url)`, or `None` when logs are not
    /// configured at all (spec.md §4.3 "Backend detection").
    fn resolve_backend(&self) -> Option<(LogsBackendId, String)> {
        if let Some(url) = &self.config.url {
            let backend = self.config.backend_override.unwrap_or_else(|| {
                if url.contains("loki") {
                    LogsBackendId::Loki
                } else {
                    LogsBackendId::VictoriaLogs
                }
            });
            return Some((backend, url.clone()));
        }
        if self.config.in_cluster {
            return None;
        }
        Some((LogsBackendId::VictoriaLogs, DEFAULT_LOCAL_VICTORIALOGS_URL.to_string()))
    }

    pub async fn fetch(&self, query: &LogsQuery<'_>) -> LogsResult {
        let Some((backend, base_url)) = self.resolve_backend() else {
            return LogsResult {
                entries: Vec::new(),
                status: CollectionStatus::Unavailable,
                reason: Some("not_configured".to_string()),
                backend: None,
                query_used: None,
            };
        };

        for step in LADDER {
            if step.loki_only && backend != LogsBackendId::Loki {
                continue;
            }
            let (ns_key, pod_key) = step.label_keys;

            if let Some(container) = query.container {
                match self.attempt(backend, &base_url, query, ns_key, pod_key, Some(container)).await {
                    AttemptOutcome::Ok(result) => return result,
                    AttemptOutcome::Unavailable(result) => return result,
                    AttemptOutcome::Empty => {}
                }
                match self.attempt(backend, &base_url, query, ns_key, pod_key, None).await {
                    AttemptOutcome::Ok(result) => return result,
                    AttemptOutcome::Unavailable(result) => return result,
                    AttemptOutcome::Empty => {}
                }
            } else {
                match self.attempt(backend, &base_url, query, ns_key, pod_key, None).await {
                    AttemptOutcome::Ok(result) => return result,
                    AttemptOutcome::Unavailable(result) => return result,
                    AttemptOutcome::Empty => {}
                }
            }
        }

        LogsResult {
            entries: Vec::new(),
            status: CollectionStatus::Empty,
            reason: Some("no_matching_entries".to_string()),
            backend: Some(backend),
            query_used: None,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn attempt(
        &self,
        backend: LogsBackendId,
        base_url: &str,
        query: &LogsQuery<'_>,
        ns_key: &str,
        pod_key: &str,
        container: Option<&str>,
    ) -> AttemptOutcome {
        let mut labels: Vec<(&str, &str)> = vec![(ns_key, query.namespace), (pod_key, query.pod)];
        if let Some(container) = container {
            labels.push(("container", container));
        }
        // Only the pod-identity field is ever regex, and only when the
        // caller asked for regex mode (spec.md §4.3; historical_fallback's
        // prefix-regex pod lookup sets this, ordinary exact-name lookups
        // don't).
        let regex_fields: &[&str] = if query.regex_mode { &[pod_key] } else { &[] };

        let (query_string, fetch_result) = match backend {
            LogsBackendId::Loki => {
                let query_string = loki::build_selector(&labels, regex_fields);
                let result = self.fetch_loki(base_url, &query_string, query).await;
                (query_string, result)
            }
            LogsBackendId::VictoriaLogs => {
                let query_string = victorialogs::build_query(&labels, regex_fields);
                let result = self.fetch_victorialogs(base_url, &query_string, query).await;
                (query_string, result)
            }
        };

        match fetch_result {
            Ok(entries) if entries.is_empty() => AttemptOutcome::Empty,
            Ok(entries) => {
                let mut heap = NewestN::new(query.limit);
                for entry in entries {
                    heap.push(entry);
                }
                AttemptOutcome::Ok(LogsResult {
                    entries: heap.into_sorted_ascending(),
                    status: CollectionStatus::Ok,
                    reason: None,
                    backend: Some(backend),
                    query_used: Some(query_string),
                })
            }
            Err(reason) => AttemptOutcome::Unavailable(LogsResult {
                entries: Vec::new(),
                status: CollectionStatus::Unavailable,
                reason: Some(reason),
                backend: Some(backend),
                query_used: Some(query_string),
            }),
        }
    }

    async fn fetch_loki(&self, base_url: &str, query_string: &str, query: &LogsQuery<'_>) -> Result<Vec<LogEntry>, String> {
        let url = format!("{base_url}/loki/api/v1/query_range");
        let response = self
            .http
            .get(url)
            .query(&[
                ("query", query_string.to_string()),
                ("start", loki::to_unix_nanos(query.start).to_string()),
                ("end", loki::to_unix_nanos(query.end).to_string()),
                ("limit", query.limit.to_string()),
                ("direction", "backward".to_string()),
            ])
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            warn!(%status, "loki query failed");
            return Err("http_error".to_string());
        }
        let body = response.text().await.map_err(|e| classify_transport_error(&e))?;
        Ok(loki::parse_query_range_response(&body))
    }

    async fn fetch_victorialogs(&self, base_url: &str, query_string: &str, query: &LogsQuery<'_>) -> Result<Vec<LogEntry>, String> {
        let url = format!("{base_url}/select/logsql/query");
        let response = self
            .http
            .get(url)
            .query(&[
                ("query", query_string.to_string()),
                ("start", victorialogs::to_rfc3339_z(query.start)),
                ("end", victorialogs::to_rfc3339_z(query.end)),
            ])
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            warn!(%status, "victorialogs query failed");
            return Err("http_error".to_string());
        }
        let body = response.text().await.map_err(|e| classify_transport_error(&e))?;
        Ok(victorialogs::parse_ndjson_response(&body))
    }
}

enum AttemptOutcome {
    Ok(LogsResult),
    Empty,
    Unavailable(LogsResult),
}

fn classify_transport_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timeout".to_string()
    } else if err.is_connect() {
        "connection_error".to_string()
    } else {
        "unexpected_error".to_string()
    }
}
