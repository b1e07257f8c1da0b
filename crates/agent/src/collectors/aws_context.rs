//! `aws_context` collector (spec.md §4.2): resolves AWS identity from
//! the alert/pod, then fans out across the configured `AwsProvider`
//! plus a CloudTrail lookback, grouped by event category.

use cloud::metadata::{extract_aws_metadata, AwsMetadataInput};
use cloud::models::{group_by_category, AwsEvidence, CloudTrailMetadata};

use crate::collectors::CollectorSlots;
use crate::model::TargetRef;
use crate::pipeline::AgentContext;

/// Gather AWS evidence, or record a short error and return an empty
/// patch when the cloud provider isn't configured or a call fails.
pub async fn collect(
    ctx: &AgentContext,
    target: &TargetRef,
    alert_labels: &std::collections::HashMap<String, String>,
    node_provider_id: Option<&str>,
    container_images: &[String],
    irsa_role_arn: Option<&str>,
) -> CollectorSlots {
    let mut slots = CollectorSlots::default();

    let Some(aws) = ctx.aws.as_ref() else {
        slots.errors.push(("aws_context", "not_configured".to_string()));
        return slots;
    };

    let input = AwsMetadataInput {
        alert_labels,
        node_provider_id,
        container_images,
        irsa_role_arn,
        default_region: &ctx.config.aws_region_or_default(),
    };
    let metadata = extract_aws_metadata(&input);

    let mut evidence = AwsEvidence { metadata: metadata.clone(), ..AwsEvidence::default() };

    if !metadata.instance_ids.is_empty() {
        match aws.describe_instances(&metadata.instance_ids).await {
            Ok(instances) => evidence.ec2_instances = instances,
            Err(err) => slots.errors.push(("aws_context", err.code())),
        }
    }

    if !metadata.ecr_repositories.is_empty() {
        match aws.describe_images(&metadata.ecr_repositories).await {
            Ok(images) => evidence.ecr_images = images,
            Err(err) => slots.errors.push(("aws_context", err.code())),
        }
    }

    let namespace = target.namespace.as_deref().unwrap_or("default");
    if let Some(workload) = target.workload_name.as_deref() {
        let lb_name = format!("{namespace}-{workload}");
        if let Ok(health) = aws.describe_load_balancer_health(&lb_name).await {
            evidence.elb_health = vec![health];
        }
    }

    let lookback_minutes = ctx.config.aws.cloudtrail_lookback_minutes;
    let max_events = ctx.config.aws.cloudtrail_max_events;
    let end = chrono::Utc::now();
    let start = end - chrono::Duration::minutes(i64::from(lookback_minutes));
    match aws.lookup_cloudtrail_events(start, end, max_events).await {
        Ok(events) => {
            let truncated = events.len() as u32 >= max_events;
            evidence.cloudtrail_grouped = group_by_category(&events);
            evidence.cloudtrail_events = events;
            evidence.cloudtrail_metadata = CloudTrailMetadata { lookback_minutes, max_events, truncated };
        }
        Err(err) => slots.errors.push(("aws_context", err.code())),
    }

    slots.succeeded = !evidence.ec2_instances.is_empty() || !evidence.cloudtrail_events.is_empty();
    slots.aws = Some(evidence);
    slots
}
