#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! Unified SCM abstraction for GitHub (and, in name only, GitLab — see
//! `DESIGN.md` for the scope decision) used by the incident-investigation
//! agent's source-control evidence collector and `github.*` chat tools.

pub mod catalog;
pub mod clean;
pub mod discovery;
pub mod error;
pub mod github;

pub use catalog::{ServiceCatalog, ThirdPartyCatalog};
pub use clean::{clean_workload_name, strip_known_suffix, KNOWN_WORKLOAD_SUFFIXES};
pub use discovery::{discover_repo, DiscoveryInput, DiscoveryMethod, DiscoveryResult, RepoRef, RepoVerifier};
pub use error::ScmError;
pub use github::GithubProvider;

#[async_trait::async_trait]
impl RepoVerifier for GithubProvider {
    async fn exists(&self, repo: &RepoRef) -> Option<bool> {
        self.repo_exists(&repo.org, &repo.name).await
    }
}
