//! `memory.similar_cases`, `memory.skills` (spec.md §4.4 tool table).
//! Persisted case/skill storage is out of scope (spec.md §6 "Persisted
//! state: none within the core"); these return a fixed built-in catalog
//! bounded by `limit`, standing in for the external memory store the
//! spec describes but does not require this core to own.

use serde_json::{json, Value};

use super::{args, ToolResult};

const SIMILAR_CASES_CATALOG: &[(&str, &str)] = &[
    ("crashloop-oom-2025", "OOMKilled crashloop resolved by raising memory limits"),
    ("crashloop-probe-2025", "Liveness probe misconfiguration causing restart storms"),
];

const SKILLS_CATALOG: &[(&str, &str)] = &[
    ("diagnose-crashloop", "Walk the crashloop decision table against current evidence"),
    ("check-rollout-health", "Compare desired vs ready replicas for the owning workload"),
];

pub fn similar_cases(call_args: &Value) -> ToolResult {
    let limit = args::usize_arg(call_args, "limit").unwrap_or(SIMILAR_CASES_CATALOG.len());
    let items: Vec<Value> = SIMILAR_CASES_CATALOG
        .iter()
        .take(limit)
        .map(|(id, summary)| json!({ "id": id, "summary": summary }))
        .collect();
    ToolResult::ok(json!({ "cases": items }))
}

pub fn skills(call_args: &Value) -> ToolResult {
    let limit = args::usize_arg(call_args, "limit").unwrap_or(SKILLS_CATALOG.len());
    let items: Vec<Value> = SKILLS_CATALOG
        .iter()
        .take(limit)
        .map(|(id, description)| json!({ "id": id, "description": description }))
        .collect();
    ToolResult::ok(json!({ "skills": items }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_cases_respects_limit() {
        let result = similar_cases(&json!({"limit": 1}));
        assert_eq!(result.result.unwrap()["cases"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn skills_defaults_to_full_catalog() {
        let result = skills(&json!({}));
        assert_eq!(result.result.unwrap()["skills"].as_array().unwrap().len(), SKILLS_CATALOG.len());
    }
}
