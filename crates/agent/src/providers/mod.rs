//! Provider abstractions (spec.md §4.5): narrow, mockable, read-only
//! façades over K8s, PromQL, the dual-dialect logs backends, and the LLM.

pub mod k8s;
pub mod llm;
pub mod logs;
pub mod metrics;

pub use k8s::{K8sProvider, KubeK8sProvider, MockK8sProvider};
pub use llm::{HttpLlmClient, LlmClient};
pub use logs::{LogsClient, LogsClientConfig, LogsQuery, LogsResult};
pub use metrics::{MockPromqlProvider, PrometheusProvider, PromqlProvider};
