#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! Process configuration for the incident-investigation agent.
//!
//! Every key is optional unless noted; this mirrors the Alertmanager/SRE
//! tooling convention of configuring entirely through the environment
//! rather than a config file, matching how `healer::prometheus::
//! PrometheusConfig` and `healer::scanner::ScannerConfig` read their
//! defaults from `std::env::var` in the teacher repo.

use std::env;
use std::time::Duration;

/// Logs backend dialect, explicit override for `LOGS_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogsBackend {
    Loki,
    VictoriaLogs,
}

impl LogsBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "loki" => Some(Self::Loki),
            "victorialogs" => Some(Self::VictoriaLogs),
            _ => None,
        }
    }
}

/// LLM provider selection, `LLM_PROVIDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    VertexAi,
    Anthropic,
}

impl LlmProvider {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "vertexai" => Some(Self::VertexAi),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }
}

/// LLM call parameters, shared by the sync and streaming clients.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: Option<String>,
    /// Clamped to `[0.0, 1.0]`.
    pub temperature: f64,
    /// Clamped to `[64, 8192]`.
    pub max_output_tokens: u32,
    /// Clamped to `[5, 300]`, default 180.
    pub timeout: Duration,
    pub mock: bool,
    pub enabled: bool,
    pub include_logs: bool,
    pub google_cloud_project: Option<String>,
    pub google_cloud_location: Option<String>,
    pub anthropic_api_key: Option<String>,
}

/// GitHub App credentials for the SCM provider.
#[derive(Debug, Clone, Default)]
pub struct GithubAppConfig {
    pub app_id: Option<String>,
    pub private_key: Option<String>,
    pub installation_id: Option<String>,
    pub default_org: Option<String>,
}

/// AWS evidence-collection tunables.
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub evidence_enabled: bool,
    pub cloudtrail_lookback_minutes: u32,
    pub cloudtrail_max_events: u32,
}

/// Top-level process configuration, assembled once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub cluster_name: Option<String>,
    pub logs_url: Option<String>,
    pub logs_backend: Option<LogsBackend>,
    pub promql_url: Option<String>,
    /// Clamped to `[1, 60]`, default 10.
    pub logs_timeout: Duration,
    pub aws: AwsConfig,
    pub github_evidence_enabled: bool,
    pub github_app: GithubAppConfig,
    pub llm: LlmConfig,
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn env_bool(key: &str) -> bool {
    env::var(key).map(|v| parse_bool(&v)).unwrap_or(false)
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64_clamped(key: &str, default: u64, min: u64, max: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn env_u32_clamped(key: &str, default: u32, min: u32, max: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn env_f64_clamped(key: &str, default: f64, min: f64, max: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

impl AgentConfig {
    /// Load configuration from the process environment. Never fails:
    /// unparsable or missing values fall back to documented defaults.
    pub fn from_env() -> Self {
        let logs_backend = env::var("LOGS_BACKEND")
            .ok()
            .and_then(|v| LogsBackend::parse(&v));

        let llm_provider = env::var("LLM_PROVIDER")
            .ok()
            .and_then(|v| LlmProvider::parse(&v))
            .unwrap_or(LlmProvider::VertexAi);

        AgentConfig {
            cluster_name: env_string("CLUSTER_NAME"),
            logs_url: env_string("LOGS_URL"),
            logs_backend,
            promql_url: env_string("PROMQL_URL"),
            logs_timeout: Duration::from_secs(env_u64_clamped(
                "LOGS_TIMEOUT_SECONDS",
                10,
                1,
                60,
            )),
            aws: AwsConfig {
                region: env_string("AWS_REGION"),
                evidence_enabled: env_bool("AWS_EVIDENCE_ENABLED"),
                cloudtrail_lookback_minutes: env_u32_clamped(
                    "AWS_CLOUDTRAIL_LOOKBACK_MINUTES",
                    30,
                    1,
                    u32::MAX,
                ),
                cloudtrail_max_events: env_u32_clamped(
                    "AWS_CLOUDTRAIL_MAX_EVENTS",
                    50,
                    1,
                    u32::MAX,
                ),
            },
            github_evidence_enabled: env_bool("GITHUB_EVIDENCE_ENABLED"),
            github_app: GithubAppConfig {
                app_id: env_string("GITHUB_APP_ID"),
                private_key: env_string("GITHUB_APP_PRIVATE_KEY"),
                installation_id: env_string("GITHUB_APP_INSTALLATION_ID"),
                default_org: env_string("GITHUB_DEFAULT_ORG"),
            },
            llm: LlmConfig {
                provider: llm_provider,
                model: env_string("LLM_MODEL"),
                temperature: env_f64_clamped("LLM_TEMPERATURE", 0.2, 0.0, 1.0),
                max_output_tokens: env_u32_clamped("LLM_MAX_OUTPUT_TOKENS", 2048, 64, 8192),
                timeout: Duration::from_secs(env_u64_clamped(
                    "LLM_TIMEOUT_SECONDS",
                    180,
                    5,
                    300,
                )),
                mock: env_bool("LLM_MOCK"),
                enabled: env_bool("LLM_ENABLED"),
                include_logs: env_bool("LLM_INCLUDE_LOGS"),
                google_cloud_project: env_string("GOOGLE_CLOUD_PROJECT"),
                google_cloud_location: env_string("GOOGLE_CLOUD_LOCATION"),
                anthropic_api_key: env_string("ANTHROPIC_API_KEY"),
            },
        }
    }

    /// Default region: configured value, else `us-east-1`.
    pub fn aws_region_or_default(&self) -> String {
        self.aws
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_all() {
        for key in [
            "CLUSTER_NAME",
            "LOGS_URL",
            "LOGS_BACKEND",
            "LOGS_TIMEOUT_SECONDS",
            "AWS_REGION",
            "AWS_EVIDENCE_ENABLED",
            "GITHUB_EVIDENCE_ENABLED",
            "AWS_CLOUDTRAIL_LOOKBACK_MINUTES",
            "AWS_CLOUDTRAIL_MAX_EVENTS",
            "GITHUB_APP_ID",
            "GITHUB_APP_PRIVATE_KEY",
            "GITHUB_APP_INSTALLATION_ID",
            "GITHUB_DEFAULT_ORG",
            "LLM_PROVIDER",
            "LLM_MODEL",
            "LLM_TEMPERATURE",
            "LLM_MAX_OUTPUT_TOKENS",
            "LLM_TIMEOUT_SECONDS",
            "LLM_MOCK",
            "LLM_ENABLED",
            "LLM_INCLUDE_LOGS",
            "GOOGLE_CLOUD_PROJECT",
            "GOOGLE_CLOUD_LOCATION",
            "ANTHROPIC_API_KEY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear_all();
        let cfg = AgentConfig::from_env();
        assert!(cfg.cluster_name.is_none());
        assert_eq!(cfg.logs_timeout, Duration::from_secs(10));
        assert_eq!(cfg.llm.timeout, Duration::from_secs(180));
        assert!(matches!(cfg.llm.provider, LlmProvider::VertexAi));
        assert_eq!(cfg.aws_region_or_default(), "us-east-1");
        assert_eq!(cfg.aws.cloudtrail_lookback_minutes, 30);
        assert_eq!(cfg.aws.cloudtrail_max_events, 50);
    }

    #[test]
    #[serial]
    fn bool_accepts_documented_truthy_spellings() {
        for val in ["1", "true", "YES", "y", "ON"] {
            env::set_var("AWS_EVIDENCE_ENABLED", val);
            assert!(parse_bool(val), "expected {val} to parse truthy");
        }
        env::remove_var("AWS_EVIDENCE_ENABLED");
    }

    #[test]
    #[serial]
    fn bool_rejects_other_values() {
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
        assert!(!parse_bool("maybe"));
    }

    #[test]
    #[serial]
    fn logs_timeout_is_clamped() {
        clear_all();
        env::set_var("LOGS_TIMEOUT_SECONDS", "999");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.logs_timeout, Duration::from_secs(60));
        env::set_var("LOGS_TIMEOUT_SECONDS", "0");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.logs_timeout, Duration::from_secs(1));
        clear_all();
    }

    #[test]
    #[serial]
    fn llm_timeout_and_tokens_are_clamped() {
        clear_all();
        env::set_var("LLM_TIMEOUT_SECONDS", "1");
        env::set_var("LLM_MAX_OUTPUT_TOKENS", "10");
        env::set_var("LLM_TEMPERATURE", "5.0");
        let cfg = AgentConfig::from_env();
        assert_eq!(cfg.llm.timeout, Duration::from_secs(5));
        assert_eq!(cfg.llm.max_output_tokens, 64);
        assert!((cfg.llm.temperature - 1.0).abs() < f64::EPSILON);
        clear_all();
    }

    #[test]
    #[serial]
    fn explicit_logs_backend_override() {
        clear_all();
        env::set_var("LOGS_BACKEND", "Loki");
        let cfg = AgentConfig::from_env();
        assert!(matches!(cfg.logs_backend, Some(LogsBackend::Loki)));
        clear_all();
    }
}
