//! `promql.instant` (spec.md §4.4 tool table).

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{args, ToolResult};
use crate::error::ErrorCode;
use crate::pipeline::AgentContext;

pub async fn instant(ctx: &AgentContext, call_args: &Value) -> ToolResult {
    let Some(query) = args::str_arg(call_args, "query") else {
        return ToolResult::err(ErrorCode::MissingRequiredArgs("query".to_string()));
    };

    let at: DateTime<Utc> = args::str_arg(call_args, "at")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(Utc::now);

    match ctx.metrics.instant(query, at).await {
        Ok(mut series) => {
            let cap = ctx.chat_policy.max_promql_series;
            if series.len() > cap {
                series.truncate(cap);
            }
            ToolResult::ok(json!({
                "at": at,
                "query": query,
                "result": series,
            }))
        }
        Err(err) => ToolResult::err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::evidence::LabelledSeries;
    use crate::providers::k8s::MockK8sProvider;
    use crate::providers::logs::{LogsClient, LogsClientConfig};
    use crate::providers::metrics::MockPromqlProvider;
    use crate::tools::ChatPolicy;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn ctx_with_series(query: &str, series: Vec<LabelledSeries>) -> AgentContext {
        let mut metrics = MockPromqlProvider::default();
        metrics.instant_responses.insert(query.to_string(), series);
        AgentContext {
            config: crate::tools::tests_support::config(),
            k8s: Arc::new(MockK8sProvider::default()),
            metrics: Arc::new(metrics),
            logs: LogsClient::new(LogsClientConfig::default()),
            aws: None,
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
    async fn missing_query_is_rejected() {
        let ctx = ctx_with_series("up", vec![]);
        let result = instant(&ctx, &serde_json::json!({})).await;
        assert_eq!(result.error.as_deref(), Some("missing_required_args:query"));
    }

    #[tokio::test]
    async fn series_are_capped_at_policy_max() {
        let series = vec![LabelledSeries { labels: HashMap::new(), samples: vec![] }; 3];
        let mut ctx = ctx_with_series("up", series);
        ctx.chat_policy.max_promql_series = 2;
        let result = instant(&ctx, &serde_json::json!({"query": "up"})).await;
        assert!(result.ok);
        let returned = result.result.unwrap();
        assert_eq!(returned["result"].as_array().unwrap().len(), 2);
    }
}
