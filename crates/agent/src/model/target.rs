//! `TargetRef` (spec.md §3): the incident's identity, filled
//! progressively by pipeline stages and collectors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Pod,
    Service,
    Node,
    Cluster,
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetRef {
    pub cluster: Option<String>,
    pub namespace: Option<String>,
    pub pod: Option<String>,
    pub container: Option<String>,
    pub workload_kind: Option<String>,
    pub workload_name: Option<String>,
    pub service: Option<String>,
    pub job: Option<String>,
    pub instance: Option<String>,
    pub team: Option<String>,
    pub environment: Option<String>,
    pub playbook: Option<String>,
    #[serde(default = "default_target_type")]
    pub target_type: TargetType,
}

fn default_target_type() -> TargetType {
    TargetType::Unknown
}

impl Default for TargetType {
    fn default() -> Self {
        Self::Unknown
    }
}

impl TargetRef {
    /// Write a field only if it is currently unset (spec.md §3: "once a
    /// non-null field is written by a collector it is not overwritten
    /// except by a higher-trust source").
    pub fn fill_cluster(&mut self, value: impl Into<String>) {
        if self.cluster.is_none() {
            self.cluster = Some(value.into());
        }
    }

    pub fn fill_namespace(&mut self, value: impl Into<String>) {
        if self.namespace.is_none() {
            self.namespace = Some(value.into());
        }
    }

    pub fn fill_pod(&mut self, value: impl Into<String>) {
        if self.pod.is_none() {
            self.pod = Some(value.into());
        }
    }

    /// Higher-trust write: owner-chain/rollout-status writes may replace
    /// a label-derived value (spec.md §3).
    pub fn set_workload(&mut self, kind: impl Into<String>, name: impl Into<String>) {
        self.workload_kind = Some(kind.into());
        self.workload_name = Some(name.into());
    }

    pub fn fill_team(&mut self, value: impl Into<String>) {
        if self.team.is_none() {
            self.team = Some(value.into());
        }
    }

    pub fn fill_environment(&mut self, value: impl Into<String>) {
        if self.environment.is_none() {
            self.environment = Some(value.into());
        }
    }

    /// Pod-scoped alerts drop scrape-target metadata: it identifies the
    /// scraper, not the incident (spec.md §4.1 stage 4).
    pub fn clear_scrape_metadata(&mut self) {
        self.service = None;
        self.job = None;
        self.instance = None;
    }

    /// Non-pod families clear `pod` entirely (spec.md §4.1 stage 4).
    pub fn clear_pod(&mut self) {
        self.pod = None;
    }
}

/// Recognized label keys for team/environment lookup, in precedence
/// order (spec.md §4.1 stage 7).
pub const TEAM_LABEL_KEYS: &[&str] = &["team", "owner", "squad", "app.kubernetes.io/team"];
pub const ENVIRONMENT_LABEL_KEYS: &[&str] =
    &["environment", "env", "tf_env", "app.kubernetes.io/environment"];
