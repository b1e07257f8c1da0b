#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! Investigation pipeline, tool runtime, and provider abstractions for
//! the SRE incident-investigation agent (spec.md §1).
//!
//! Three public surfaces, matching spec.md §1:
//! - [`pipeline::run_investigation`] — the investigation pipeline (§4.1).
//! - [`tools`] — the policy-gated tool runtime for chat (§4.4).
//! - [`providers`] — K8s/metrics/logs/LLM provider façades (§4.5).

pub mod analysis;
pub mod collectors;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod providers;
pub mod tools;

pub use error::ErrorCode;
pub use model::{AlertEvent, Evidence, Investigation, TargetRef, TimeWindow};
pub use pipeline::{run_investigation, AgentContext};
