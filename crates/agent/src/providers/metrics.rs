//! Metrics provider (spec.md §4.5): PromQL instant/range queries backed
//! by `prometheus-http-query`, the same crate the Rust self-healing K8s
//! operator in the example pack uses for this role (SPEC_FULL §4.5).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prometheus_http_query::Client as PromClient;

use crate::error::ErrorCode;
use crate::model::evidence::{LabelledSeries, MetricSample};

#[async_trait]
pub trait PromqlProvider: Send + Sync {
    async fn instant(&self, query: &str, at: DateTime<Utc>) -> Result<Vec<LabelledSeries>, ErrorCode>;
    async fn range(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: u64,
    ) -> Result<Vec<LabelledSeries>, ErrorCode>;
}

pub struct PrometheusProvider {
    client: PromClient,
}

impl PrometheusProvider {
    /// # Errors
    /// Returns `ErrorCode::PromqlError` if the base URL cannot be
    /// parsed into a client.
    pub fn new(base_url: &str) -> Result<Self, ErrorCode> {
        let client = PromClient::try_from(base_url)
            .map_err(|e| ErrorCode::PromqlError(format!("invalid_url:{e}")))?;
        Ok(Self { client })
    }
}

fn classify(err: &prometheus_http_query::Error) -> ErrorCode {
    ErrorCode::PromqlError(err.to_string())
}

#[async_trait]
impl PromqlProvider for PrometheusProvider {
    async fn instant(&self, query: &str, at: DateTime<Utc>) -> Result<Vec<LabelledSeries>, ErrorCode> {
        let response = self
            .client
            .query(query)
            .at(at.timestamp())
            .get()
            .await
            .map_err(|e| classify(&e))?;

        let vector = response.data().clone().into_vector().map_err(|e| classify(&e))?;
        Ok(vector
            .into_iter()
            .map(|v| {
                let labels: HashMap<String, String> =
                    v.metric().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                let sample = v.sample();
                LabelledSeries {
                    labels,
                    samples: vec![MetricSample {
                        timestamp: DateTime::from_timestamp(sample.timestamp() as i64, 0).unwrap_or_default(),
                        value: sample.value(),
                    }],
                }
            })
            .collect())
    }

    async fn range(
        &self,
        query: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step_seconds: u64,
    ) -> Result<Vec<LabelledSeries>, ErrorCode> {
        let response = self
            .client
            .query_range(query, start.timestamp(), end.timestamp(), step_seconds as f64)
            .get()
            .await
            .map_err(|e| classify(&e))?;

        let matrix = response.data().clone().into_matrix().map_err(|e| classify(&e))?;
        Ok(matrix
            .into_iter()
            .map(|series| {
                let labels: HashMap<String, String> =
                    series.metric().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                let samples = series
                    .samples()
                    .iter()
                    .map(|s| MetricSample {
                        timestamp: DateTime::from_timestamp(s.timestamp() as i64, 0).unwrap_or_default(),
                        value: s.value(),
                    })
                    .collect();
                LabelledSeries { labels, samples }
            })
            .collect())
    }
}

/// Fixed in-memory mock, used by collector/analysis tests.
#[derive(Default, Clone)]
pub struct MockPromqlProvider {
    pub instant_responses: HashMap<String, Vec<LabelledSeries>>,
    pub range_responses: HashMap<String, Vec<LabelledSeries>>,
}

#[async_trait]
impl PromqlProvider for MockPromqlProvider {
    async fn instant(&self, query: &str, _at: DateTime<Utc>) -> Result<Vec<LabelledSeries>, ErrorCode> {
        Ok(self.instant_responses.get(query).cloned().unwrap_or_default())
    }

    async fn range(
        &self,
        query: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _step_seconds: u64,
    ) -> Result<Vec<LabelledSeries>, ErrorCode> {
        Ok(self.range_responses.get(query).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_configured_series_for_query() {
        let mut mock = MockPromqlProvider::default();
        mock.instant_responses.insert(
            "up".to_string(),
            vec![LabelledSeries { labels: HashMap::new(), samples: vec![] }],
        );
        let result = mock.instant("up", Utc::now()).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn mock_returns_empty_for_unconfigured_query() {
        let mock = MockPromqlProvider::default();
        let result = mock.instant("unknown", Utc::now()).await.unwrap();
        assert!(result.is_empty());
    }
}
