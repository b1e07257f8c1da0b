//! Arg parsing helpers shared by every tool handler (spec.md §4.4): pull
//! a field out of the caller-supplied `args` object, falling back to
//! `analysis_json.target` where the tool table says a default comes
//! "from target".

use serde_json::Value;

use crate::error::ErrorCode;

#[must_use]
pub fn str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

#[must_use]
pub fn u64_arg(args: &Value, key: &str) -> Option<u64> {
    args.get(key).and_then(Value::as_u64)
}

#[must_use]
pub fn usize_arg(args: &Value, key: &str) -> Option<usize> {
    u64_arg(args, key).and_then(|v| usize::try_from(v).ok())
}

/// `args.<key>`, else `analysis_json.target.<key>` (every target field
/// the tool table marks "from target" follows this precedence).
#[must_use]
pub fn str_with_target_fallback<'a>(args: &'a Value, analysis_json: &'a Value, key: &str) -> Option<&'a str> {
    str_arg(args, key).or_else(|| analysis_json.get("target").and_then(|t| t.get(key)).and_then(Value::as_str))
}

pub fn require_str<'a>(args: &'a Value, analysis_json: &'a Value, key: &str) -> Result<&'a str, ErrorCode> {
    str_with_target_fallback(args, analysis_json, key).ok_or_else(|| ErrorCode::MissingRequiredArgs(key.to_string()))
}

/// Require several fields at once, reporting all missing names together
/// (spec.md §7 `missing_required_args:<names>`).
pub fn require_all<'a>(
    args: &'a Value,
    analysis_json: &'a Value,
    keys: &[&str],
) -> Result<Vec<&'a str>, ErrorCode> {
    let mut values = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();
    for key in keys {
        match str_with_target_fallback(args, analysis_json, key) {
            Some(value) => values.push(value),
            None => missing.push(*key),
        }
    }
    if missing.is_empty() {
        Ok(values)
    } else {
        Err(ErrorCode::MissingRequiredArgs(missing.join(",")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falls_back_to_target_when_arg_absent() {
        let args = json!({});
        let analysis = json!({"target": {"namespace": "ns1"}});
        assert_eq!(str_with_target_fallback(&args, &analysis, "namespace"), Some("ns1"));
    }

    #[test]
    fn explicit_arg_wins_over_target() {
        let args = json!({"namespace": "ns2"});
        let analysis = json!({"target": {"namespace": "ns1"}});
        assert_eq!(str_with_target_fallback(&args, &analysis, "namespace"), Some("ns2"));
    }

    #[test]
    fn require_all_reports_every_missing_field() {
        let args = json!({});
        let analysis = json!({"target": {}});
        let err = require_all(&args, &analysis, &["namespace", "pod"]).unwrap_err();
        assert_eq!(err.to_string(), "missing_required_args:namespace,pod");
    }
}
