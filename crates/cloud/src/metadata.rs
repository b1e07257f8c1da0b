//! AWS metadata extractor (spec.md §4.2): resolves account id, region,
//! EC2 instance ids and ECR repositories for the alert's target before
//! any AWS API call is made, in strict precedence order.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::AwsMetadata;

lazy_static! {
    /// `<account>.dkr.ecr.<region>.amazonaws.com/<repo>:<tag>`
    static ref ECR_IMAGE_PATTERN: Regex = Regex::new(
        r"^(?P<account>\d{12})\.dkr\.ecr\.(?P<region>[a-z0-9-]+)\.amazonaws\.com/(?P<repo>[^:@]+)(?::(?P<tag>[^@]+))?",
    )
    .unwrap();
}

struct EcrRef {
    account_id: String,
    region: String,
    repository: String,
}

fn parse_ecr_image(image: &str) -> Option<EcrRef> {
    let caps = ECR_IMAGE_PATTERN.captures(image)?;
    Some(EcrRef {
        account_id: caps["account"].to_string(),
        region: caps["region"].to_string(),
        repository: caps["repo"].to_string(),
    })
}

/// Extract an account id from an IAM role ARN
/// (`arn:aws:iam::<account>:role/<name>`), as surfaced by a pod's
/// `eks.amazonaws.com/role-arn` IRSA annotation.
fn account_id_from_role_arn(arn: &str) -> Option<String> {
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() >= 5 && parts[0] == "arn" && parts[2] == "iam" {
        Some(parts[4].to_string())
    } else {
        None
    }
}

/// Inputs to the extractor, gathered by the pipeline before this runs.
pub struct AwsMetadataInput<'a> {
    pub alert_labels: &'a HashMap<String, String>,
    pub node_provider_id: Option<&'a str>,
    pub container_images: &'a [String],
    /// `eks.amazonaws.com/role-arn` from the pod's service account, an
    /// `original_source`-only supplement (SPEC_FULL §4.2).
    pub irsa_role_arn: Option<&'a str>,
    pub default_region: &'a str,
}

/// `aws:///<az>/<instance-id>` node provider ID, as set by the AWS cloud
/// provider on `Node.spec.providerID`.
fn instance_id_from_provider_id(provider_id: &str) -> Option<String> {
    provider_id.rsplit('/').next().map(str::to_string).filter(|s| !s.is_empty())
}

#[must_use]
pub fn extract_aws_metadata(input: &AwsMetadataInput<'_>) -> AwsMetadata {
    let mut metadata = AwsMetadata::default();

    // Step 1: alert labels.
    if let Some(account) = input.alert_labels.get("aws_account_id") {
        metadata.account_id = Some(account.clone());
        metadata.discovered_via.push("alert_labels".to_string());
    }
    if let Some(region) = input.alert_labels.get("aws_region") {
        metadata.region = Some(region.clone());
    }
    if let Some(instance_id) = input.alert_labels.get("instance_id") {
        metadata.instance_ids.push(instance_id.clone());
    }

    // Step 2: K8s node name / provider ID.
    if let Some(provider_id) = input.node_provider_id {
        if let Some(instance_id) = instance_id_from_provider_id(provider_id) {
            metadata.instance_ids.push(instance_id);
            metadata.discovered_via.push("k8s_node".to_string());
        }
    }

    // Step 3: container images (ECR references).
    for image in input.container_images {
        if let Some(ecr) = parse_ecr_image(image) {
            if metadata.account_id.is_none() {
                metadata.account_id = Some(ecr.account_id);
            }
            if metadata.region.is_none() {
                metadata.region = Some(ecr.region);
            }
            metadata.ecr_repositories.push(ecr.repository);
            metadata.discovered_via.push("container_images".to_string());
        }
    }

    // Step 4 [ADD]: IRSA role ARN, used only to backfill account id.
    if metadata.account_id.is_none() {
        if let Some(arn) = input.irsa_role_arn {
            if let Some(account) = account_id_from_role_arn(arn) {
                metadata.account_id = Some(account);
                metadata.discovered_via.push("irsa_role_arn".to_string());
            }
        }
    }

    if metadata.region.is_none() {
        metadata.region = Some(input.default_region.to_string());
    }

    metadata.instance_ids.sort();
    metadata.instance_ids.dedup();
    metadata.ecr_repositories.sort();
    metadata.ecr_repositories.dedup();
    metadata.discovered_via.sort();
    metadata.discovered_via.dedup();

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_prefers_alert_labels_over_images() {
        let labels = HashMap::from([("aws_account_id".to_string(), "111111111111".to_string())]);
        let images = vec!["222222222222.dkr.ecr.us-west-2.amazonaws.com/app:latest".to_string()];
        let input = AwsMetadataInput {
            alert_labels: &labels,
            node_provider_id: None,
            container_images: &images,
            irsa_role_arn: None,
            default_region: "us-east-1",
        };
        let metadata = extract_aws_metadata(&input);
        assert_eq!(metadata.account_id.as_deref(), Some("111111111111"));
        assert_eq!(metadata.ecr_repositories, vec!["app".to_string()]);
    }

    #[test]
    fn falls_back_to_irsa_role_arn() {
        let labels = HashMap::new();
        let images = vec![];
        let input = AwsMetadataInput {
            alert_labels: &labels,
            node_provider_id: None,
            container_images: &images,
            irsa_role_arn: Some("arn:aws:iam::333333333333:role/my-service-role"),
            default_region: "us-east-1",
        };
        let metadata = extract_aws_metadata(&input);
        assert_eq!(metadata.account_id.as_deref(), Some("333333333333"));
    }

    #[test]
    fn defaults_region_when_nothing_found() {
        let labels = HashMap::new();
        let images = vec![];
        let input = AwsMetadataInput {
            alert_labels: &labels,
            node_provider_id: None,
            container_images: &images,
            irsa_role_arn: None,
            default_region: "us-east-1",
        };
        let metadata = extract_aws_metadata(&input);
        assert_eq!(metadata.region.as_deref(), Some("us-east-1"));
    }

    #[test]
    fn node_provider_id_yields_instance_id() {
        let labels = HashMap::new();
        let images = vec![];
        let input = AwsMetadataInput {
            alert_labels: &labels,
            node_provider_id: Some("aws:///us-east-1a/i-0123456789abcdef0"),
            container_images: &images,
            irsa_role_arn: None,
            default_region: "us-east-1",
        };
        let metadata = extract_aws_metadata(&input);
        assert_eq!(metadata.instance_ids, vec!["i-0123456789abcdef0".to_string()]);
    }
}
