//! `aws.*` (spec.md §4.4 tool table): resource IDs default from
//! `evidence.aws.metadata` when not given explicitly; region is enforced
//! against `aws_region_allowlist` when configured.

use serde_json::{json, Value};

use super::{args, ToolResult};
use crate::error::ErrorCode;
use crate::pipeline::AgentContext;

fn metadata_ids(analysis_json: &Value, field: &str) -> Vec<String> {
    analysis_json
        .get("evidence")
        .and_then(|e| e.get("aws"))
        .and_then(|a| a.get("metadata"))
        .and_then(|m| m.get(field))
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn metadata_region(analysis_json: &Value) -> Option<String> {
    analysis_json
        .get("evidence")
        .and_then(|e| e.get("aws"))
        .and_then(|a| a.get("metadata"))
        .and_then(|m| m.get("region"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn requested_region(ctx: &AgentContext, call_args: &Value, analysis_json: &Value) -> Result<Option<String>, ErrorCode> {
    let region = args::str_arg(call_args, "region").map(str::to_string).or_else(|| metadata_region(analysis_json));
    if let (Some(region), Some(allowlist)) = (&region, &ctx.chat_policy.aws_region_allowlist) {
        if !allowlist.iter().any(|r| r == region) {
            return Err(ErrorCode::RegionNotAllowed(region.clone()));
        }
    }
    Ok(region)
}

fn ids_arg(call_args: &Value, key: &str) -> Option<Vec<String>> {
    call_args.get(key).and_then(Value::as_array).map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
}

pub async fn dispatch(ctx: &AgentContext, tool_name: &str, call_args: &Value, analysis_json: &Value) -> ToolResult {
    let Some(aws) = ctx.aws.as_ref() else {
        return ToolResult::err(ErrorCode::NotConfigured);
    };
    if let Err(err) = requested_region(ctx, call_args, analysis_json) {
        return ToolResult::err(err);
    }

    match tool_name {
        "aws.describe_instances" => {
            let ids = ids_arg(call_args, "instance_ids").unwrap_or_else(|| metadata_ids(analysis_json, "instance_ids"));
            match aws.describe_instances(&ids).await {
                Ok(instances) => ToolResult::ok(json!({ "instances": instances })),
                Err(err) => ToolResult::err(ErrorCode::AwsError("describe_instances".to_string(), Some(err.to_string()))),
            }
        }
        "aws.describe_volumes" => {
            let Some(ids) = ids_arg(call_args, "volume_ids") else {
                return ToolResult::err(ErrorCode::MissingRequiredArgs("volume_ids".to_string()));
            };
            match aws.describe_volumes(&ids).await {
                Ok(volumes) => ToolResult::ok(json!({ "volumes": volumes })),
                Err(err) => ToolResult::err(ErrorCode::AwsError("describe_volumes".to_string(), Some(err.to_string()))),
            }
        }
        "aws.describe_load_balancer_health" => {
            let Some(name) = args::str_arg(call_args, "load_balancer_name") else {
                return ToolResult::err(ErrorCode::MissingRequiredArgs("load_balancer_name".to_string()));
            };
            match aws.describe_load_balancer_health(name).await {
                Ok(health) => ToolResult::ok(serde_json::to_value(health).unwrap_or(Value::Null)),
                Err(err) => ToolResult::err(ErrorCode::AwsError("describe_load_balancer_health".to_string(), Some(err.to_string()))),
            }
        }
        "aws.describe_db_instances" => {
            let Some(ids) = ids_arg(call_args, "db_instance_ids") else {
                return ToolResult::err(ErrorCode::MissingRequiredArgs("db_instance_ids".to_string()));
            };
            match aws.describe_db_instances(&ids).await {
                Ok(instances) => ToolResult::ok(json!({ "db_instances": instances })),
                Err(err) => ToolResult::err(ErrorCode::AwsError("describe_db_instances".to_string(), Some(err.to_string()))),
            }
        }
        "aws.describe_images" => {
            let repos = ids_arg(call_args, "repository_names").unwrap_or_else(|| metadata_ids(analysis_json, "ecr_repositories"));
            match aws.describe_images(&repos).await {
                Ok(images) => ToolResult::ok(json!({ "images": images })),
                Err(err) => ToolResult::err(ErrorCode::AwsError("describe_images".to_string(), Some(err.to_string()))),
            }
        }
        "aws.cloudtrail_events" => {
            let window = analysis_json.get("window");
            let Some(start) = window.and_then(|w| w.get("start")).and_then(Value::as_str).and_then(|s| s.parse().ok()) else {
                return ToolResult::err(ErrorCode::MissingRequiredArgs("start".to_string()));
            };
            let Some(end) = window.and_then(|w| w.get("end")).and_then(Value::as_str).and_then(|s| s.parse().ok()) else {
                return ToolResult::err(ErrorCode::MissingRequiredArgs("end".to_string()));
            };
            let max_events = args::u64_arg(call_args, "max_events").unwrap_or(50) as u32;
            match aws.lookup_cloudtrail_events(start, end, max_events).await {
                Ok(events) => {
                    let grouped = cloud::models::group_by_category(&events);
                    ToolResult::ok(json!({ "events": events, "grouped": grouped }))
                }
                Err(err) => ToolResult::err(ErrorCode::AwsError("cloudtrail_events".to_string(), Some(err.to_string()))),
            }
        }
        _ => ToolResult::err(ErrorCode::UnknownTool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::k8s::MockK8sProvider;
    use crate::providers::logs::{LogsClient, LogsClientConfig};
    use crate::providers::metrics::MockPromqlProvider;
    use crate::tools::ChatPolicy;
    use cloud::client::AwsClient;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ctx_with_aws() -> AgentContext {
        AgentContext {
            config: crate::tools::tests_support::config(),
            k8s: Arc::new(MockK8sProvider::default()),
            metrics: Arc::new(MockPromqlProvider::default()),
            logs: LogsClient::new(LogsClientConfig::default()),
            aws: Some(Arc::new(AwsClient::new("us-east-1"))),
            github: None,
            llm: None,
            service_catalog: scm::ServiceCatalog::default(),
            third_party_catalog: scm::ThirdPartyCatalog::default(),
            chat_policy: ChatPolicy::default(),
            modules: Vec::new(),
            playbooks: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn unconfigured_aws_provider_yields_not_configured() {
        let mut ctx = ctx_with_aws();
        ctx.aws = None;
        let result = dispatch(&ctx, "aws.describe_instances", &json!({}), &json!({})).await;
        assert_eq!(result.error.as_deref(), Some("not_configured"));
    }

    #[tokio::test]
    async fn region_outside_allowlist_is_rejected() {
        let mut ctx = ctx_with_aws();
        ctx.chat_policy.aws_region_allowlist = Some(vec!["us-east-1".to_string()]);
        let result = dispatch(
            &ctx,
            "aws.describe_instances",
            &json!({"region": "eu-west-1", "instance_ids": ["i-1"]}),
            &json!({}),
        )
        .await;
        assert_eq!(result.error.as_deref(), Some("region_not_allowed:eu-west-1"));
    }

    #[tokio::test]
    async fn volume_ids_required() {
        let ctx = ctx_with_aws();
        let result = dispatch(&ctx, "aws.describe_volumes", &json!({}), &json!({})).await;
        assert_eq!(result.error.as_deref(), Some("missing_required_args:volume_ids"));
    }
}
