//! Typed AWS evidence records (spec.md §3 `evidence.aws`).
//!
//! Modeled the way the teacher's `cloud::providers::aws::models` typed
//! its EKS/EC2 request and response shapes: plain `serde` structs with
//! only the fields the collector actually consumes, dropping unknown
//! upstream fields rather than carrying them through (spec.md §9 design
//! note: "Unknown fields are dropped, not propagated").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ec2Instance {
    pub instance_id: String,
    pub instance_type: String,
    pub state: String,
    pub availability_zone: String,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub launch_time: Option<DateTime<Utc>>,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbsVolume {
    pub volume_id: String,
    pub state: String,
    pub size_gib: u32,
    pub volume_type: String,
    pub attached_instance_id: Option<String>,
    pub iops: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElbTargetHealth {
    pub target_id: String,
    pub port: u16,
    pub health_state: String,
    pub reason: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElbHealth {
    pub load_balancer_name: String,
    pub targets: Vec<ElbTargetHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdsInstance {
    pub db_instance_identifier: String,
    pub engine: String,
    pub status: String,
    pub allocated_storage_gib: u32,
    pub multi_az: bool,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcrImage {
    pub repository_name: String,
    pub image_tag: Option<String>,
    pub image_digest: String,
    pub pushed_at: Option<DateTime<Utc>>,
    pub scan_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkingInfo {
    pub vpc_id: Option<String>,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// Resolved AWS identity for the alert's target, assembled by the
/// metadata extractor before any AWS API calls are issued.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AwsMetadata {
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub instance_ids: Vec<String>,
    pub ecr_repositories: Vec<String>,
    pub discovered_via: Vec<String>,
}

/// One of the eight CloudTrail grouping categories (spec.md §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    SecurityGroup,
    AutoScaling,
    Ec2Lifecycle,
    IamPolicy,
    Storage,
    Database,
    Networking,
    LoadBalancer,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloudTrailEvent {
    pub event_id: String,
    pub event_name: String,
    pub event_time: DateTime<Utc>,
    pub username: Option<String>,
    pub resources: Vec<String>,
    pub category: EventCategory,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AwsEvidence {
    pub ec2_instances: Vec<Ec2Instance>,
    pub ebs_volumes: Vec<EbsVolume>,
    pub elb_health: Vec<ElbHealth>,
    pub rds_instances: Vec<RdsInstance>,
    pub ecr_images: Vec<EcrImage>,
    pub networking: NetworkingInfo,
    pub metadata: AwsMetadata,
    /// Chronological.
    pub cloudtrail_events: Vec<CloudTrailEvent>,
    /// `category -> events`, chronological order preserved per group.
    pub cloudtrail_grouped: HashMap<EventCategory, Vec<CloudTrailEvent>>,
    pub cloudtrail_metadata: CloudTrailMetadata,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CloudTrailMetadata {
    pub lookback_minutes: u32,
    pub max_events: u32,
    pub truncated: bool,
}

/// Group chronological CloudTrail events by category, preserving
/// chronological order within each group (spec.md §5).
#[must_use]
pub fn group_by_category(events: &[CloudTrailEvent]) -> HashMap<EventCategory, Vec<CloudTrailEvent>> {
    let mut grouped: HashMap<EventCategory, Vec<CloudTrailEvent>> = HashMap::new();
    for event in events {
        grouped.entry(event.category).or_default().push(event.clone());
    }
    grouped
}

/// Classify a raw CloudTrail `eventName` into one of the eight
/// categories, by substring on well-known event-name prefixes.
#[must_use]
pub fn classify_event_name(event_name: &str) -> EventCategory {
    let name = event_name;
    if name.starts_with("AuthorizeSecurityGroup")
        || name.starts_with("RevokeSecurityGroup")
        || name.contains("SecurityGroup")
    {
        EventCategory::SecurityGroup
    } else if name.contains("AutoScaling") || name.starts_with("UpdateAutoScalingGroup") {
        EventCategory::AutoScaling
    } else if name.starts_with("RunInstances")
        || name.starts_with("TerminateInstances")
        || name.starts_with("StopInstances")
        || name.starts_with("StartInstances")
        || name.starts_with("RebootInstances")
    {
        EventCategory::Ec2Lifecycle
    } else if name.contains("Policy") || name.starts_with("AttachRolePolicy") || name.starts_with("PutRolePolicy") {
        EventCategory::IamPolicy
    } else if name.contains("Volume") || name.contains("Bucket") || name.contains("Snapshot") {
        EventCategory::Storage
    } else if name.starts_with("RDS") || name.contains("DBInstance") || name.contains("DBCluster") {
        EventCategory::Database
    } else if name.contains("Subnet") || name.contains("RouteTable") || name.contains("Vpc") {
        EventCategory::Networking
    } else if name.contains("LoadBalancer") || name.contains("TargetGroup") {
        EventCategory::LoadBalancer
    } else {
        EventCategory::Networking
    }
}
