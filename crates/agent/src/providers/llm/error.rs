//! LLM error classification (spec.md §4.5, P10). Check order is
//! significant to avoid false positives: timeout family outranks auth,
//! which outranks not-found, rate-limit, and truncation.

use crate::error::ErrorCode;

/// Classify a raw provider error message/status into a stable code.
/// `model` is used only to parameterize `model_not_found`.
#[must_use]
pub fn classify(message: &str, status: Option<u16>, model: &str) -> ErrorCode {
    let upper = message.to_ascii_uppercase();

    // 1. timeout family.
    if status == Some(408) {
        return ErrorCode::Timeout;
    }
    if status == Some(504) {
        return ErrorCode::GatewayTimeout;
    }
    if upper.contains("DEADLINE_EXCEEDED") {
        return ErrorCode::DeadlineExceeded;
    }
    if upper.contains("TIMEOUT") || upper.contains("TIMED OUT") {
        return ErrorCode::Timeout;
    }

    // 2. auth.
    if status == Some(403) || upper.contains("PERMISSION_DENIED") {
        return ErrorCode::PermissionDenied;
    }
    if status == Some(401) || upper.contains("UNAUTHENTICATED") {
        return ErrorCode::Unauthenticated;
    }

    // 3. not found.
    if status == Some(404) {
        return ErrorCode::ModelNotFound(model.to_string());
    }

    // 4. rate limit.
    if status == Some(429) || upper.contains("OVERLOADED") || upper.contains("RATE LIMIT") {
        return ErrorCode::RateLimited;
    }

    // 5. truncation.
    if upper.contains("MAX_TOKENS") || upper.contains("CONTEXT LENGTH") {
        return ErrorCode::MaxTokensTruncated;
    }

    ErrorCode::LlmError("unexpected_error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p10_timeout_outranks_auth_codes() {
        let code = classify("TIMEOUT: 403 PERMISSION_DENIED", None, "claude");
        assert_eq!(code.to_string(), "timeout");
    }

    #[test]
    fn classifies_deadline_exceeded() {
        assert_eq!(classify("grpc DEADLINE_EXCEEDED", None, "m").to_string(), "deadline_exceeded");
    }

    #[test]
    fn classifies_rate_limit_by_status_or_text() {
        assert_eq!(classify("", Some(429), "m").to_string(), "rate_limited");
        assert_eq!(classify("model is OVERLOADED", None, "m").to_string(), "rate_limited");
    }

    #[test]
    fn classifies_model_not_found_with_model_name() {
        assert_eq!(classify("", Some(404), "gpt-5").to_string(), "model_not_found:gpt-5");
    }

    #[test]
    fn classifies_max_tokens_truncation() {
        assert_eq!(classify("stopped: MAX_TOKENS", None, "m").to_string(), "max_tokens_truncated");
    }

    #[test]
    fn falls_back_to_llm_error() {
        assert_eq!(classify("something odd", None, "m").to_string(), "llm_error:unexpected_error");
    }
}
