//! GitHub dialect of the SCM provider (spec.md §4.5), backed by
//! `octocrab` — the same GitHub crate the teacher already depends on in
//! `controller/Cargo.toml` for PR lookups (`controller::tasks::github`).

use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::EncodingKey;
use octocrab::models::{AppId, InstallationId};
use octocrab::Octocrab;
use serde::Serialize;
use tracing::warn;

use crate::error::ScmError;

#[derive(Debug, Clone, Serialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: Option<String>,
    pub authored_at: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub status: String,
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocFile {
    pub path: String,
    pub content: String,
}

/// Narrow, read-only GitHub facade. Never performs write operations.
pub struct GithubProvider {
    client: Octocrab,
}

impl GithubProvider {
    /// Build a client authenticated with a personal access token, used
    /// mainly by tests and local development.
    pub fn new_with_token(token: impl Into<String>) -> Result<Self, ScmError> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(ScmError::github)?;
        Ok(Self { client })
    }

    /// Build a client authenticated as a GitHub App installation.
    /// Octocrab caches and refreshes the installation token internally
    /// ahead of its expiry, so no bespoke refresh logic is needed here.
    pub fn new_app(
        app_id: u64,
        private_key_pem: &str,
        installation_id: u64,
    ) -> Result<Self, ScmError> {
        let key = jsonwebtoken_key(private_key_pem)?;
        let app_client = Octocrab::builder()
            .app(AppId(app_id), key)
            .build()
            .map_err(ScmError::github)?;
        let client = app_client.installation(InstallationId(installation_id));
        Ok(Self { client })
    }

    /// Unauthenticated client, rate limited — used as a last resort so
    /// the naming-convention verification step (spec.md step 5) can
    /// still run without credentials configured.
    pub fn anonymous() -> Result<Self, ScmError> {
        let client = Octocrab::builder().build().map_err(ScmError::github)?;
        Ok(Self { client })
    }

    /// HEAD-equivalent existence check used by the naming-convention
    /// verification step. Returns `None` when the check itself could
    /// not be carried out (network failure), distinct from `Some(false)`
    /// (confirmed not found).
    pub async fn repo_exists(&self, org: &str, repo: &str) -> Option<bool> {
        match self.client.repos(org, repo).get().await {
            Ok(_) => Some(true),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                Some(false)
            }
            Err(err) => {
                warn!(org, repo, error = %err, "repo existence check failed");
                None
            }
        }
    }

    pub async fn recent_commits(
        &self,
        org: &str,
        repo: &str,
        limit: u8,
    ) -> Result<Vec<Commit>, ScmError> {
        let page = self
            .client
            .repos(org, repo)
            .list_commits()
            .per_page(limit)
            .send()
            .await
            .map_err(ScmError::github)?;

        Ok(page
            .items
            .into_iter()
            .map(|c| {
                let author_name = c.commit.author.as_ref().and_then(|a| a.name.clone());
                let authored_at = c.commit.author.as_ref().and_then(|a| a.date);
                Commit {
                    sha: c.sha,
                    message: c.commit.message,
                    author: author_name,
                    authored_at,
                    html_url: Some(c.html_url),
                }
            })
            .collect())
    }

    pub async fn workflow_runs(
        &self,
        org: &str,
        repo: &str,
        limit: usize,
    ) -> Result<Vec<WorkflowRun>, ScmError> {
        let runs = self
            .client
            .workflows(org, repo)
            .list_all_runs()
            .send()
            .await
            .map_err(ScmError::github)?;

        Ok(runs
            .items
            .into_iter()
            .take(limit)
            .map(|r| WorkflowRun {
                id: r.id.0,
                name: Some(r.name),
                status: r.status,
                conclusion: r.conclusion,
                created_at: r.created_at,
                html_url: r.html_url.to_string(),
            })
            .collect())
    }

    /// Best-effort retrieval of the plain-text log for a single failed
    /// workflow job. GitHub serves run-level logs as a zip archive, so
    /// this targets the per-job text endpoint instead via a raw request
    /// signed with the same installation/PAT credentials octocrab holds.
    pub async fn failed_workflow_job_log(
        &self,
        org: &str,
        repo: &str,
        job_id: u64,
    ) -> Result<String, ScmError> {
        let route = format!("/repos/{org}/{repo}/actions/jobs/{job_id}/logs");
        self.client
            .get(route, None::<&()>)
            .await
            .map_err(ScmError::github)
    }

    pub async fn readme(&self, org: &str, repo: &str) -> Result<Option<String>, ScmError> {
        match self.client.repos(org, repo).get_content().path("README.md").send().await {
            Ok(mut content) => Ok(decode_first_file(&mut content)),
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                Ok(None)
            }
            Err(err) => Err(ScmError::github(err)),
        }
    }

    /// Fetch markdown files directly under `docs/`, non-recursive.
    pub async fn docs(&self, org: &str, repo: &str) -> Result<Vec<DocFile>, ScmError> {
        let listing = match self.client.repos(org, repo).get_content().path("docs").send().await {
            Ok(listing) => listing,
            Err(octocrab::Error::GitHub { source, .. }) if source.status_code.as_u16() == 404 => {
                return Ok(Vec::new());
            }
            Err(err) => return Err(ScmError::github(err)),
        };

        let mut docs = Vec::new();
        for item in listing.items {
            if !item.name.ends_with(".md") {
                continue;
            }
            if let Ok(mut file) = self
                .client
                .repos(org, repo)
                .get_content()
                .path(&item.path)
                .send()
                .await
            {
                if let Some(content) = decode_first_file(&mut file) {
                    docs.push(DocFile { path: item.path, content });
                }
            }
        }
        Ok(docs)
    }
}

fn decode_first_file(content: &mut octocrab::models::repos::ContentItems) -> Option<String> {
    let item = content.items.first_mut()?;
    let encoded = item.content.take()?;
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(cleaned).ok()?;
    String::from_utf8(bytes).ok()
}

fn jsonwebtoken_key(pem: &str) -> Result<EncodingKey, ScmError> {
    EncodingKey::from_rsa_pem(pem.as_bytes())
        .map_err(|e| ScmError::github(format!("invalid_private_key:{e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn anonymous_client_constructs() {
        let provider = GithubProvider::anonymous();
        assert!(provider.is_ok());
    }
}
