#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! Read-only AWS resource-health and CloudTrail evidence for the
//! incident-investigation agent (spec.md §4.2, §4.5).
//!
//! GCP and Azure are out of scope: spec.md names only AWS among cloud
//! providers (see `DESIGN.md` for the scope decision).

pub mod client;
pub mod error;
pub mod metadata;
pub mod models;

pub use client::{AwsClient, AwsProvider};
pub use error::CloudError;
pub use metadata::{extract_aws_metadata, AwsMetadataInput};
pub use models::{
    AwsEvidence, AwsMetadata, CloudTrailEvent, EbsVolume, Ec2Instance, EcrImage, ElbHealth,
    ElbTargetHealth, EventCategory, NetworkingInfo, RdsInstance,
};
