//! The stable short error-code taxonomy (spec.md §7). Every collector,
//! tool, and provider failure is converted to one of these at its
//! boundary rather than propagated as a raw `anyhow::Error`, so that
//! `Investigation.errors` entries and `ToolResult.error` values are
//! guaranteed well-formed, grep-able strings.

use std::fmt;

/// A closed error code with a `Display` impl producing the exact short
/// string from spec.md §7 (including `:<suffix>` parameterized forms).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // transport
    Timeout,
    GatewayTimeout,
    DeadlineExceeded,
    ConnectionError,
    HttpError,
    UnexpectedError,

    // config
    NotConfigured,
    MissingGcpProject,
    MissingGcpLocation,
    MissingAdcCredentials,
    MissingApiKey,
    SdkImportFailed(String),
    ProviderNotConfigured,
    AdcImportFailed,

    // authz/policy
    ToolNotAllowed,
    NamespaceNotAllowed(String),
    ClusterNotAllowed(String),
    RegionNotAllowed(String),
    RepoNotAllowed(String),

    // semantic
    MissingRequiredArgs(String),
    InvalidPath,
    TimeWindowTooLarge,
    RepoNotDiscovered,
    CaseActionLimitReached,
    UnknownTool,

    // provider-scoped
    PromqlError(String),
    K8sError(String, Option<String>),
    AwsError(String, Option<String>),
    GithubError(String),
    LogsError(String),
    MemoryError(String),

    // LLM
    RateLimited,
    PermissionDenied,
    Unauthenticated,
    ModelNotFound(String),
    MaxTokensTruncated,
    LlmError(String),
    JsonParseFailed,
    SchemaOutputUnexpected,
    SchemaDumpFailed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::GatewayTimeout => write!(f, "gateway_timeout"),
            Self::DeadlineExceeded => write!(f, "deadline_exceeded"),
            Self::ConnectionError => write!(f, "connection_error"),
            Self::HttpError => write!(f, "http_error"),
            Self::UnexpectedError => write!(f, "unexpected_error"),

            Self::NotConfigured => write!(f, "not_configured"),
            Self::MissingGcpProject => write!(f, "missing_gcp_project"),
            Self::MissingGcpLocation => write!(f, "missing_gcp_location"),
            Self::MissingAdcCredentials => write!(f, "missing_adc_credentials"),
            Self::MissingApiKey => write!(f, "missing_api_key"),
            Self::SdkImportFailed(sdk) => write!(f, "sdk_import_failed:{sdk}"),
            Self::ProviderNotConfigured => write!(f, "provider_not_configured"),
            Self::AdcImportFailed => write!(f, "adc_import_failed"),

            Self::ToolNotAllowed => write!(f, "tool_not_allowed"),
            Self::NamespaceNotAllowed(ns) => write!(f, "namespace_not_allowed:{ns}"),
            Self::ClusterNotAllowed(c) => write!(f, "cluster_not_allowed:{c}"),
            Self::RegionNotAllowed(r) => write!(f, "region_not_allowed:{r}"),
            Self::RepoNotAllowed(r) => write!(f, "repo_not_allowed:{r}"),

            Self::MissingRequiredArgs(fields) => write!(f, "missing_required_args:{fields}"),
            Self::InvalidPath => write!(f, "invalid_path"),
            Self::TimeWindowTooLarge => write!(f, "time_window_too_large"),
            Self::RepoNotDiscovered => write!(f, "repo_not_discovered"),
            Self::CaseActionLimitReached => write!(f, "case_action_limit_reached"),
            Self::UnknownTool => write!(f, "unknown_tool"),

            Self::PromqlError(kind) => write!(f, "promql_error:{kind}"),
            Self::K8sError(kind, None) => write!(f, "k8s_error:{kind}"),
            Self::K8sError(kind, Some(msg)) => write!(f, "k8s_error:{kind}:{msg}"),
            Self::AwsError(kind, None) => write!(f, "aws_error:{kind}"),
            Self::AwsError(kind, Some(msg)) => write!(f, "aws_error:{kind}:{msg}"),
            Self::GithubError(kind) => write!(f, "github_error:{kind}"),
            Self::LogsError(kind) => write!(f, "logs_error:{kind}"),
            Self::MemoryError(kind) => write!(f, "memory_error:{kind}"),

            Self::RateLimited => write!(f, "rate_limited"),
            Self::PermissionDenied => write!(f, "permission_denied"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::ModelNotFound(m) => write!(f, "model_not_found:{m}"),
            Self::MaxTokensTruncated => write!(f, "max_tokens_truncated"),
            Self::LlmError(kind) => write!(f, "llm_error:{kind}"),
            Self::JsonParseFailed => write!(f, "json_parse_failed"),
            Self::SchemaOutputUnexpected => write!(f, "schema_output_unexpected"),
            Self::SchemaDumpFailed => write!(f, "schema_dump_failed"),
        }
    }
}

impl ErrorCode {
    /// Prefix a code with its originating subsystem, producing the
    /// compact `{subsystem}:{cause-code}` string every collector appends
    /// to `Investigation.errors` (spec.md §4.1 failure semantics).
    #[must_use]
    pub fn for_subsystem(&self, subsystem: &str) -> String {
        format!("{subsystem}:{self}")
    }

    /// Convert an ad-hoc internal `anyhow::Error` raised inside a
    /// collector into a stable code at the collector boundary
    /// (SPEC_FULL §7).
    #[must_use]
    pub fn from_anyhow(subsystem: &str, err: &anyhow::Error) -> String {
        Self::UnexpectedError
            .for_subsystem(subsystem)
            .replace("unexpected_error", &format!("unexpected_error:{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterized_codes_render_exact_strings() {
        assert_eq!(ErrorCode::RegionNotAllowed("eu-west-1".into()).to_string(), "region_not_allowed:eu-west-1");
        assert_eq!(
            ErrorCode::K8sError("not_found".into(), Some("pod p1".into())).to_string(),
            "k8s_error:not_found:pod p1"
        );
        assert_eq!(ErrorCode::K8sError("not_found".into(), None).to_string(), "k8s_error:not_found");
        assert_eq!(ErrorCode::ModelNotFound("gpt".into()).to_string(), "model_not_found:gpt");
    }

    #[test]
    fn subsystem_prefix_is_compact() {
        assert_eq!(ErrorCode::Timeout.for_subsystem("logs"), "logs:timeout");
    }
}
