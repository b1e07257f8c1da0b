//! Result compaction (spec.md §4.4): every tool result passes through a
//! size cap before it reaches the caller, and list fields are capped
//! per-tool ahead of that (e.g. PromQL series capped at
//! `max_promql_series`).

use serde_json::Value;

use super::ToolResult;

/// Above this many serialized bytes, a result is replaced by a
/// `{truncated, preview}` stand-in rather than returned whole.
const DEFAULT_SIZE_BOUND_BYTES: usize = 16 * 1024;
const PREVIEW_CHARS: usize = 2000;

/// Cap a tool result's JSON representation to a byte bound, replacing
/// oversized results with `{truncated: true, preview: first_N_chars}`.
#[must_use]
pub fn compact(value: Value) -> Value {
    compact_with_bound(value, DEFAULT_SIZE_BOUND_BYTES)
}

#[must_use]
pub fn compact_with_bound(value: Value, bound_bytes: usize) -> Value {
    let rendered = value.to_string();
    if rendered.len() <= bound_bytes {
        return value;
    }
    let preview: String = rendered.chars().take(PREVIEW_CHARS).collect();
    serde_json::json!({ "truncated": true, "preview": preview })
}

/// Cap a JSON array field to `max_items`, keeping the first `max_items`
/// entries (callers pass already-ordered arrays, e.g. chronological
/// logs or PromQL series in their natural order).
pub fn cap_array(value: &mut Value, field: &str, max_items: usize) {
    if let Some(array) = value.get_mut(field).and_then(Value::as_array_mut) {
        if array.len() > max_items {
            array.truncate(max_items);
        }
    }
}

/// Apply the size cap to a tool's `result` field, leaving a failed or
/// rerun-style (`updated_analysis`-only) result untouched.
#[must_use]
pub fn compact_tool_result(mut tool_result: ToolResult) -> ToolResult {
    if let Some(result) = tool_result.result.take() {
        tool_result.result = Some(compact(result));
    }
    tool_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_result_passes_through_unchanged() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(compact(value.clone()), value);
    }

    #[test]
    fn oversized_result_is_replaced_with_preview() {
        let huge = serde_json::json!({"data": "x".repeat(100_000)});
        let compacted = compact_with_bound(huge, 1024);
        assert_eq!(compacted.get("truncated").and_then(Value::as_bool), Some(true));
        assert!(compacted.get("preview").is_some());
    }

    #[test]
    fn cap_array_truncates_list_field() {
        let mut value = serde_json::json!({"result": [1, 2, 3, 4, 5]});
        cap_array(&mut value, "result", 2);
        assert_eq!(value["result"].as_array().unwrap().len(), 2);
    }
}
