//! K8s provider (spec.md §4.5): a narrow, read-only façade over `kube`
//! exposing only the operations collectors and chat tools need.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::Client;
use tracing::warn;

use crate::error::ErrorCode;
use crate::model::{OwnerChain, PodEvent, PodInfo, RolloutStatus};

#[async_trait]
pub trait K8sProvider: Send + Sync {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodInfo, ErrorCode>;
    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodInfo>, ErrorCode>;
    async fn list_events(&self, namespace: &str, involved_object: &str) -> Result<Vec<PodEvent>, ErrorCode>;
    async fn get_rollout_status(&self, namespace: &str, kind: &str, name: &str) -> Result<RolloutStatus, ErrorCode>;
    async fn get_owner_chain(&self, namespace: &str, pod: &str) -> Result<OwnerChain, ErrorCode>;
    async fn previous_container_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<Vec<String>, ErrorCode>;
    async fn service_account_annotations(
        &self,
        namespace: &str,
        service_account: &str,
    ) -> Result<std::collections::HashMap<String, String>, ErrorCode>;
    async fn node_provider_id(&self, node_name: &str) -> Result<Option<String>, ErrorCode>;
}

/// `kube`-backed implementation.
pub struct KubeK8sProvider {
    client: Client,
}

impl KubeK8sProvider {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn classify(err: &kube::Error) -> ErrorCode {
        match err {
            kube::Error::Api(api_err) if api_err.code == 404 => {
                ErrorCode::K8sError("not_found".to_string(), None)
            }
            kube::Error::Api(api_err) if api_err.code == 401 || api_err.code == 403 => {
                ErrorCode::K8sError("auth".to_string(), None)
            }
            other => ErrorCode::K8sError("unexpected_error".to_string(), Some(other.to_string())),
        }
    }
}

#[async_trait]
impl K8sProvider for KubeK8sProvider {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodInfo, ErrorCode> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = api.get(name).await.map_err(|e| Self::classify(&e))?;
        Ok(pod_to_info(&pod))
    }

    async fn list_pods(&self, namespace: &str, label_selector: &str) -> Result<Vec<PodInfo>, ErrorCode> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| Self::classify(&e))?;
        let mut pods: Vec<PodInfo> = list.items.iter().map(pod_to_info).collect();
        // "pick the most recently created pod" (spec.md §4.2, §4.4).
        pods.sort_by_key(|p| p.start_time);
        Ok(pods)
    }

    async fn list_events(&self, _namespace: &str, _involved_object: &str) -> Result<Vec<PodEvent>, ErrorCode> {
        warn!("list_events not wired to a live events API in this build");
        Ok(Vec::new())
    }

    async fn get_rollout_status(&self, _namespace: &str, _kind: &str, _name: &str) -> Result<RolloutStatus, ErrorCode> {
        Err(ErrorCode::K8sError("not_implemented".to_string(), None))
    }

    async fn get_owner_chain(&self, _namespace: &str, _pod: &str) -> Result<OwnerChain, ErrorCode> {
        Ok(OwnerChain::default())
    }

    async fn previous_container_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        tail_lines: i64,
    ) -> Result<Vec<String>, ErrorCode> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = kube::api::LogParams {
            container: Some(container.to_string()),
            previous: true,
            tail_lines: Some(tail_lines),
            ..Default::default()
        };
        let logs = api.logs(pod, &params).await.map_err(|e| Self::classify(&e))?;
        Ok(logs.lines().map(str::to_string).collect())
    }

    async fn service_account_annotations(
        &self,
        _namespace: &str,
        _service_account: &str,
    ) -> Result<std::collections::HashMap<String, String>, ErrorCode> {
        Ok(std::collections::HashMap::new())
    }

    async fn node_provider_id(&self, _node_name: &str) -> Result<Option<String>, ErrorCode> {
        Ok(None)
    }
}

fn pod_to_info(pod: &Pod) -> PodInfo {
    let status = pod.status.as_ref();
    let phase = status.and_then(|s| s.phase.clone()).unwrap_or_default();
    let start_time: Option<DateTime<Utc>> = status.and_then(|s| s.start_time.as_ref()).map(|t| t.0);
    let containers = pod
        .status
        .as_ref()
        .map(|s| s.container_statuses.clone().unwrap_or_default())
        .unwrap_or_default()
        .into_iter()
        .map(|cs| crate::model::evidence::ContainerStatus {
            name: cs.name,
            ready: cs.ready,
            restart_count: cs.restart_count,
            waiting_reason: cs.state.as_ref().and_then(|s| s.waiting.as_ref()).and_then(|w| w.reason.clone()),
            last_terminated: cs.last_state.as_ref().and_then(|s| s.terminated.as_ref()).map(|t| {
                crate::model::evidence::ContainerLastTerminated {
                    exit_code: t.exit_code,
                    reason: t.reason.clone(),
                    started_at: t.started_at.as_ref().map(|s| s.0),
                    finished_at: t.finished_at.as_ref().map(|f| f.0),
                }
            }),
        })
        .collect();

    PodInfo {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        phase,
        node_name: pod.spec.as_ref().and_then(|s| s.node_name.clone()),
        start_time,
        containers,
    }
}

/// A fixed, in-memory mock for collector/tool tests (spec.md §4.5:
/// "each may be replaced by a mock for testing").
#[derive(Default, Clone)]
pub struct MockK8sProvider {
    pub pods: std::collections::HashMap<(String, String), PodInfo>,
    pub events: std::collections::HashMap<String, Vec<PodEvent>>,
    pub owner_chains: std::collections::HashMap<(String, String), OwnerChain>,
    pub rollout_statuses: std::collections::HashMap<(String, String, String), RolloutStatus>,
    pub previous_logs: std::collections::HashMap<(String, String, String), Vec<String>>,
    pub not_found: std::collections::HashSet<(String, String)>,
}

#[async_trait]
impl K8sProvider for MockK8sProvider {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<PodInfo, ErrorCode> {
        let key = (namespace.to_string(), name.to_string());
        if self.not_found.contains(&key) {
            return Err(ErrorCode::K8sError("not_found".to_string(), None));
        }
        self.pods.get(&key).cloned().ok_or_else(|| ErrorCode::K8sError("not_found".to_string(), None))
    }

    async fn list_pods(&self, namespace: &str, _label_selector: &str) -> Result<Vec<PodInfo>, ErrorCode> {
        Ok(self
            .pods
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, pod)| pod.clone())
            .collect())
    }

    async fn list_events(&self, _namespace: &str, involved_object: &str) -> Result<Vec<PodEvent>, ErrorCode> {
        Ok(self.events.get(involved_object).cloned().unwrap_or_default())
    }

    async fn get_rollout_status(&self, namespace: &str, kind: &str, name: &str) -> Result<RolloutStatus, ErrorCode> {
        self.rollout_statuses
            .get(&(namespace.to_string(), kind.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ErrorCode::K8sError("not_found".to_string(), None))
    }

    async fn get_owner_chain(&self, namespace: &str, pod: &str) -> Result<OwnerChain, ErrorCode> {
        Ok(self
            .owner_chains
            .get(&(namespace.to_string(), pod.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn previous_container_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
        _tail_lines: i64,
    ) -> Result<Vec<String>, ErrorCode> {
        Ok(self
            .previous_logs
            .get(&(namespace.to_string(), pod.to_string(), container.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn service_account_annotations(
        &self,
        _namespace: &str,
        _service_account: &str,
    ) -> Result<std::collections::HashMap<String, String>, ErrorCode> {
        Ok(std::collections::HashMap::new())
    }

    async fn node_provider_id(&self, _node_name: &str) -> Result<Option<String>, ErrorCode> {
        Ok(None)
    }
}
