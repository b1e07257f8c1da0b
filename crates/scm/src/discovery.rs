//! The eight-step repo-discovery fallback chain (spec.md §4.2).
//! Each step returns `(repo | None, method-tag)`; the first hit wins.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::catalog::{ServiceCatalog, ThirdPartyCatalog};
use crate::clean::{clean_workload_name, strip_known_suffix, KNOWN_WORKLOAD_SUFFIXES};

/// A validated `org/repo` reference (spec.md P8: two non-empty parts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoRef {
    pub org: String,
    pub name: String,
}

impl RepoRef {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(2, '/');
        let org = parts.next()?;
        let name = parts.next()?;
        if org.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self {
            org: org.to_string(),
            name: name.to_string(),
        })
    }

    #[must_use]
    pub fn full(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }
}

/// Which of the eight steps produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    WorkloadAnnotation,
    AlertLabel,
    ServiceCatalog,
    ThirdPartyCatalog,
    NamingConvention,
    HelmReleaseSecret,
    OciImageLabel,
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    pub repo: Option<RepoRef>,
    pub method: DiscoveryMethod,
    /// Only meaningful for `NamingConvention`: whether the candidate was
    /// confirmed to exist, or accepted unverified because verification
    /// was unavailable.
    pub verified: bool,
}

/// Verifies that a repo exists at the SCM provider (the naming-convention
/// guard step). `None` means verification could not be performed.
#[async_trait]
pub trait RepoVerifier: Send + Sync {
    async fn exists(&self, repo: &RepoRef) -> Option<bool>;
}

pub struct DiscoveryInput<'a> {
    pub workload_annotations: &'a HashMap<String, String>,
    pub alert_labels: &'a HashMap<String, String>,
    pub workload_name: &'a str,
    pub user_catalog: &'a ServiceCatalog,
    pub third_party_catalog: &'a ThirdPartyCatalog,
    pub default_org: Option<&'a str>,
    /// Org-specific annotation prefix, e.g. `"myorg.com"`, looked up as
    /// `"<prefix>/github-repo"`.
    pub org_annotation_prefix: &'a str,
}

fn lookup_first<'a>(map: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| map.get(*k)).map(String::as_str)
}

/// Run the eight-step chain. Never fails; unresolvable input falls
/// through to `DiscoveryMethod::NotFound`.
pub async fn discover_repo(
    input: &DiscoveryInput<'_>,
    verifier: &dyn RepoVerifier,
) -> DiscoveryResult {
    // Step 1: K8s workload annotations.
    let annotation_key = format!("{}/github-repo", input.org_annotation_prefix);
    if let Some(raw) = lookup_first(
        input.workload_annotations,
        &["github.com/repo", annotation_key.as_str()],
    ) {
        if let Some(repo) = RepoRef::parse(raw) {
            return DiscoveryResult {
                repo: Some(repo),
                method: DiscoveryMethod::WorkloadAnnotation,
                verified: false,
            };
        }
    }

    // Step 2: alert labels.
    if let Some(raw) = lookup_first(input.alert_labels, &["github_repo", "github_repository"]) {
        if let Some(repo) = RepoRef::parse(raw) {
            return DiscoveryResult {
                repo: Some(repo),
                method: DiscoveryMethod::AlertLabel,
                verified: false,
            };
        }
    }

    // Step 3: user service catalog, direct then fuzzy.
    if let Some(result) = catalog_lookup(input.user_catalog, input.workload_name) {
        return DiscoveryResult {
            repo: Some(result),
            method: DiscoveryMethod::ServiceCatalog,
            verified: false,
        };
    }

    // Step 4: third-party catalog, same fuzzy pass, custom overlay
    // preferred (handled inside ThirdPartyCatalog::lookup).
    if let Some(result) = third_party_lookup(input.third_party_catalog, input.workload_name) {
        return DiscoveryResult {
            repo: Some(result),
            method: DiscoveryMethod::ThirdPartyCatalog,
            verified: false,
        };
    }

    // Step 5: naming convention, verified.
    if let Some(org) = input.default_org {
        let candidates = naming_candidates(input.workload_name, org);
        let mut first_candidate = None;
        for candidate in candidates {
            if first_candidate.is_none() {
                first_candidate = Some(candidate.clone());
            }
            match verifier.exists(&candidate).await {
                Some(true) => {
                    return DiscoveryResult {
                        repo: Some(candidate),
                        method: DiscoveryMethod::NamingConvention,
                        verified: true,
                    };
                }
                Some(false) => continue,
                None => break, // verification unavailable, stop trying
            }
        }
        if let Some(candidate) = first_candidate {
            return DiscoveryResult {
                repo: Some(candidate),
                method: DiscoveryMethod::NamingConvention,
                verified: false,
            };
        }
    }

    // Steps 6-7: Helm release secret / OCI image labels. Open Question
    // in spec.md §9 — the original source's implementations are
    // unfinished TODOs, so both report "not found" per instruction.
    DiscoveryResult {
        repo: None,
        method: DiscoveryMethod::NotFound,
        verified: false,
    }
}

fn catalog_lookup(catalog: &ServiceCatalog, workload_name: &str) -> Option<RepoRef> {
    if let Some(raw) = catalog.lookup(workload_name) {
        return RepoRef::parse(&raw);
    }
    for candidate in fuzzy_candidates(workload_name) {
        if let Some(raw) = catalog.lookup(&candidate) {
            return RepoRef::parse(&raw);
        }
    }
    None
}

fn third_party_lookup(catalog: &ThirdPartyCatalog, workload_name: &str) -> Option<RepoRef> {
    if let Some(raw) = catalog.lookup(workload_name) {
        return RepoRef::parse(&raw);
    }
    for candidate in fuzzy_candidates(workload_name) {
        if let Some(raw) = catalog.lookup(&candidate) {
            return RepoRef::parse(&raw);
        }
    }
    None
}

/// Strip known suffixes and retry both the stripped name and
/// `<stripped>-service` (spec.md step 3).
fn fuzzy_candidates(workload_name: &str) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(stripped) = strip_known_suffix(workload_name) {
        out.push(stripped.to_string());
        out.push(format!("{stripped}-service"));
    }
    out
}

fn naming_candidates(workload_name: &str, org: &str) -> Vec<RepoRef> {
    let cleaned = clean_workload_name(workload_name);
    let mut names = vec![cleaned.clone()];
    for suffix in KNOWN_WORKLOAD_SUFFIXES {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            names.push(stripped.to_string());
        }
    }
    names.dedup();
    names
        .into_iter()
        .map(|name| RepoRef {
            org: org.to_string(),
            name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysTrue;
    #[async_trait]
    impl RepoVerifier for AlwaysTrue {
        async fn exists(&self, _repo: &RepoRef) -> Option<bool> {
            Some(true)
        }
    }

    struct AlwaysUnavailable;
    #[async_trait]
    impl RepoVerifier for AlwaysUnavailable {
        async fn exists(&self, _repo: &RepoRef) -> Option<bool> {
            None
        }
    }

    fn empty_input<'a>(
        workload_name: &'a str,
        user_catalog: &'a ServiceCatalog,
        third_party: &'a ThirdPartyCatalog,
        default_org: Option<&'a str>,
        annotations: &'a HashMap<String, String>,
        labels: &'a HashMap<String, String>,
    ) -> DiscoveryInput<'a> {
        DiscoveryInput {
            workload_annotations: annotations,
            alert_labels: labels,
            workload_name,
            user_catalog,
            third_party_catalog: third_party,
            default_org,
            org_annotation_prefix: "myorg.com",
        }
    }

    #[tokio::test]
    async fn repo_ref_format_validity() {
        assert!(RepoRef::parse("myorg/repo").is_some());
        assert!(RepoRef::parse("myorg").is_none());
        assert!(RepoRef::parse("myorg/").is_none());
        assert!(RepoRef::parse("/repo").is_none());
        assert!(RepoRef::parse("a/b/c").is_none());
    }

    #[tokio::test]
    async fn service_catalog_fuzzy_pass_matches_spec_s5() {
        let mut user_catalog = ServiceCatalog::default();
        user_catalog.insert("order-processing-service", "myorg/order-processing-service");
        let third_party = ThirdPartyCatalog::default();
        let annotations = HashMap::new();
        let labels = HashMap::new();

        let input = empty_input(
            "order-processing-service-executor",
            &user_catalog,
            &third_party,
            None,
            &annotations,
            &labels,
        );
        let result = discover_repo(&input, &AlwaysTrue).await;
        assert_eq!(result.method, DiscoveryMethod::ServiceCatalog);
        assert_eq!(result.repo.unwrap().full(), "myorg/order-processing-service");
    }

    #[tokio::test]
    async fn naming_convention_unverified_fallback() {
        let user_catalog = ServiceCatalog::default();
        let third_party = ThirdPartyCatalog::default();
        let annotations = HashMap::new();
        let labels = HashMap::new();
        let input = empty_input(
            "billing-worker",
            &user_catalog,
            &third_party,
            Some("myorg"),
            &annotations,
            &labels,
        );
        let result = discover_repo(&input, &AlwaysUnavailable).await;
        assert_eq!(result.method, DiscoveryMethod::NamingConvention);
        assert!(!result.verified);
        assert_eq!(result.repo.unwrap().full(), "myorg/billing-worker");
    }

    #[tokio::test]
    async fn not_found_when_nothing_matches() {
        let user_catalog = ServiceCatalog::default();
        let third_party = ThirdPartyCatalog::default();
        let annotations = HashMap::new();
        let labels = HashMap::new();
        let input = empty_input(
            "mystery-service",
            &user_catalog,
            &third_party,
            None,
            &annotations,
            &labels,
        );
        let result = discover_repo(&input, &AlwaysUnavailable).await;
        assert_eq!(result.method, DiscoveryMethod::NotFound);
        assert!(result.repo.is_none());
    }

    #[tokio::test]
    async fn workload_annotation_wins_over_everything() {
        let user_catalog = ServiceCatalog::default();
        let third_party = ThirdPartyCatalog::default();
        let mut annotations = HashMap::new();
        annotations.insert("github.com/repo".to_string(), "myorg/pinned".to_string());
        let labels = HashMap::new();
        let input = empty_input(
            "billing-worker",
            &user_catalog,
            &third_party,
            Some("myorg"),
            &annotations,
            &labels,
        );
        let result = discover_repo(&input, &AlwaysTrue).await;
        assert_eq!(result.method, DiscoveryMethod::WorkloadAnnotation);
        assert_eq!(result.repo.unwrap().full(), "myorg/pinned");
    }
}
