//! Stable short error codes for the cloud (AWS) surface (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("aws_error:{kind}")]
    Aws { kind: String },

    #[error("aws_error:{kind}:{message}")]
    AwsWithMessage { kind: String, message: String },

    #[error("region_not_allowed:{0}")]
    RegionNotAllowed(String),
}

impl CloudError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "timeout"
        } else if err.is_connect() {
            "connection_error"
        } else if err.status().is_some() {
            "http_error"
        } else {
            "unexpected_error"
        };
        Self::AwsWithMessage {
            kind: kind.to_string(),
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn code(&self) -> String {
        self.to_string()
    }
}
