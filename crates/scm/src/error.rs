//! Stable short error codes for the SCM surface (spec.md §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScmError {
    #[error("repo_not_discovered")]
    RepoNotDiscovered,

    #[error("repo_not_allowed:{0}")]
    RepoNotAllowed(String),

    #[error("github_error:{0}")]
    GithubError(String),
}

impl ScmError {
    /// The stable short code string, for embedding in
    /// `Investigation.errors` or `ToolResult.error`.
    #[must_use]
    pub fn code(&self) -> String {
        self.to_string()
    }

    pub fn github(kind: impl std::fmt::Display) -> Self {
        Self::GithubError(kind.to_string())
    }
}
