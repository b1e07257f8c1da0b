//! Read-only AWS resource-health client.
//!
//! Follows the same simplified request shape the teacher's
//! `cloud::providers::aws::client::Aws` uses for its EC2/EKS calls: a
//! plain `reqwest::Client` issuing JSON requests against the regional
//! service endpoint, without AWS SigV4 signing (the teacher's own
//! comment: "In production, implement AWS SigV4 signing" — unchanged
//! here since none of the example repos pull in `aws-sigv4` either).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::CloudError;
use crate::models::{
    classify_event_name, CloudTrailEvent, EbsVolume, Ec2Instance, EcrImage, ElbHealth,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait AwsProvider: Send + Sync {
    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Ec2Instance>, CloudError>;
    async fn describe_volumes(&self, volume_ids: &[String]) -> Result<Vec<EbsVolume>, CloudError>;
    async fn describe_load_balancer_health(&self, load_balancer_name: &str) -> Result<ElbHealth, CloudError>;
    async fn describe_db_instances(&self, db_instance_ids: &[String]) -> Result<Vec<crate::models::RdsInstance>, CloudError>;
    async fn describe_images(&self, repository_names: &[String]) -> Result<Vec<EcrImage>, CloudError>;
    async fn lookup_cloudtrail_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_events: u32,
    ) -> Result<Vec<CloudTrailEvent>, CloudError>;
}

/// Concrete AWS client. `base_url_override` lets tests point requests at
/// a `wiremock` server instead of the real regional endpoint.
#[derive(Clone)]
pub struct AwsClient {
    client: reqwest::Client,
    region: String,
    base_url_override: Option<String>,
}

impl AwsClient {
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction with static config cannot fail");
        Self {
            client,
            region: region.into(),
            base_url_override: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    fn endpoint(&self, service: &str) -> String {
        self.base_url_override
            .clone()
            .unwrap_or_else(|| format!("https://{service}.{}.amazonaws.com", self.region))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        service: &str,
        method: Method,
        path: &str,
    ) -> Result<T, CloudError> {
        let url = format!("{}{path}", self.endpoint(service));
        debug!(url = %url, "aws request");

        let request = self
            .client
            .request(method, &url)
            .header("Content-Type", "application/json")
            .header("X-Amz-Date", Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

        let response = request.send().await.map_err(|e| CloudError::from_reqwest(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| CloudError::from_reqwest(&e))?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "failed to parse aws response");
                CloudError::AwsWithMessage {
                    kind: "parse_error".to_string(),
                    message: e.to_string(),
                }
            })
        } else if status == StatusCode::NOT_FOUND {
            Err(CloudError::Aws { kind: "not_found".to_string() })
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(CloudError::Aws { kind: "auth".to_string() })
        } else {
            Err(CloudError::AwsWithMessage {
                kind: status.as_u16().to_string(),
                message: text,
            })
        }
    }
}

#[async_trait]
impl AwsProvider for AwsClient {
    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Ec2Instance>, CloudError> {
        let ids = instance_ids.join(",");
        self.request("ec2", Method::GET, &format!("/instances?ids={ids}")).await
    }

    async fn describe_volumes(&self, volume_ids: &[String]) -> Result<Vec<EbsVolume>, CloudError> {
        let ids = volume_ids.join(",");
        self.request("ec2", Method::GET, &format!("/volumes?ids={ids}")).await
    }

    async fn describe_load_balancer_health(&self, load_balancer_name: &str) -> Result<ElbHealth, CloudError> {
        self.request(
            "elasticloadbalancing",
            Method::GET,
            &format!("/target-health?name={load_balancer_name}"),
        )
        .await
    }

    async fn describe_db_instances(&self, db_instance_ids: &[String]) -> Result<Vec<crate::models::RdsInstance>, CloudError> {
        let ids = db_instance_ids.join(",");
        self.request("rds", Method::GET, &format!("/instances?ids={ids}")).await
    }

    async fn describe_images(&self, repository_names: &[String]) -> Result<Vec<EcrImage>, CloudError> {
        let repos = repository_names.join(",");
        self.request("ecr", Method::GET, &format!("/images?repositories={repos}")).await
    }

    async fn lookup_cloudtrail_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_events: u32,
    ) -> Result<Vec<CloudTrailEvent>, CloudError> {
        let path = format!(
            "/events?start={}&end={}&maxResults={max_events}",
            start.to_rfc3339(),
            end.to_rfc3339()
        );
        let raw: Vec<RawCloudTrailEvent> = self.request("cloudtrail", Method::GET, &path).await?;
        let mut events: Vec<CloudTrailEvent> = raw
            .into_iter()
            .map(|e| CloudTrailEvent {
                category: classify_event_name(&e.event_name),
                event_id: e.event_id,
                event_name: e.event_name,
                event_time: e.event_time,
                username: e.username,
                resources: e.resources,
            })
            .collect();
        events.sort_by_key(|e| e.event_time);
        Ok(events)
    }
}

#[derive(serde::Deserialize)]
struct RawCloudTrailEvent {
    #[serde(rename = "EventId")]
    event_id: String,
    #[serde(rename = "EventName")]
    event_name: String,
    #[serde(rename = "EventTime")]
    event_time: DateTime<Utc>,
    #[serde(rename = "Username", default)]
    username: Option<String>,
    #[serde(rename = "Resources", default)]
    resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn describe_instances_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("/instances.*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "instance_id": "i-0123456789abcdef0",
                "instance_type": "m6i.large",
                "state": "running",
                "availability_zone": "us-east-1a",
                "private_ip": "10.0.1.2",
                "public_ip": null,
                "launch_time": "2026-01-01T00:00:00Z",
                "tags": {}
            }])))
            .mount(&server)
            .await;

        let client = AwsClient::new("us-east-1").with_base_url(server.uri());
        let instances = client
            .describe_instances(&["i-0123456789abcdef0".to_string()])
            .await
            .unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].state, "running");
    }

    #[tokio::test]
    async fn cloudtrail_events_are_chronological() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("/events.*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"EventId": "2", "EventName": "RunInstances", "EventTime": "2026-01-01T00:05:00Z", "Resources": []},
                {"EventId": "1", "EventName": "AuthorizeSecurityGroupIngress", "EventTime": "2026-01-01T00:00:00Z", "Resources": []},
            ])))
            .mount(&server)
            .await;

        let client = AwsClient::new("us-east-1").with_base_url(server.uri());
        let events = client
            .lookup_cloudtrail_events(Utc::now(), Utc::now(), 50)
            .await
            .unwrap();
        assert_eq!(events[0].event_id, "1");
        assert_eq!(events[1].event_id, "2");
    }
}
