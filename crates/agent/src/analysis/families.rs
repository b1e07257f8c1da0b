//! Family detection (spec.md §4.1 stage 3, I5; SPEC_FULL §4.6): a
//! registry lookup on `alertname` for a playbook hint, then keyword
//! substring matching in declaration order.

use crate::model::Family;

struct FamilyRule {
    family: Family,
    hint: &'static str,
    keywords: &'static [&'static str],
}

/// Declaration order matters: substring matching stops at the first hit
/// (spec.md §4.1 stage 3).
const RULES: &[FamilyRule] = &[
    FamilyRule { family: Family::Crashloop, hint: "crashloop", keywords: &["crashloop", "crash loop", "backoff"] },
    FamilyRule { family: Family::CpuThrottling, hint: "cpu_throttling", keywords: &["cputhrottling", "cpu throttl"] },
    FamilyRule { family: Family::PodNotHealthy, hint: "pod_not_healthy", keywords: &["podnotready", "pod not ready", "pod not healthy", "kubepodnotready"] },
    FamilyRule { family: Family::Http5xx, hint: "http_5xx", keywords: &["5xx", "http5xx", "httperrorrate"] },
    FamilyRule { family: Family::OomKilled, hint: "oom_killed", keywords: &["oomkill", "out of memory"] },
    FamilyRule { family: Family::MemoryPressure, hint: "memory_pressure", keywords: &["memorypressure", "memory pressure", "highmemory"] },
    FamilyRule { family: Family::TargetDown, hint: "target_down", keywords: &["targetdown", "target down"] },
    FamilyRule { family: Family::JobFailed, hint: "job_failed", keywords: &["jobfailed", "kubejobfailed"] },
    FamilyRule { family: Family::K8sRolloutHealth, hint: "k8s_rollout_health", keywords: &["rolloutstuck", "rollout stuck", "deploymentgenerationmismatch"] },
    FamilyRule { family: Family::ObservabilityPipeline, hint: "observability_pipeline", keywords: &["prometheusrulefailures", "lokirequesterrors", "scrapefailed"] },
    FamilyRule { family: Family::Meta, hint: "meta", keywords: &["watchdog", "deadmansswitch"] },
];

/// Registry lookup on `alertname` for a playbook hint (spec.md §4.1
/// stage 3: "an inferred playbook hint (derived from a registry lookup
/// on alertname)"). Matches `RULES` in declaration order by alertname
/// substring against common naming conventions.
#[must_use]
pub fn playbook_hint(alertname: &str) -> Option<&'static str> {
    let lower = alertname.to_ascii_lowercase();
    RULES.iter().find(|r| lower.contains(&r.hint.replace('_', ""))).map(|r| r.hint)
}

/// Classify an incident into one of the closed families (spec.md §4.1
/// stage 3, I5). `alertname` and `hint` are lower-cased and concatenated
/// before substring matching.
#[must_use]
pub fn detect_family(alertname: &str, hint: Option<&str>) -> Family {
    if let Some(hint) = hint {
        if let Some(rule) = RULES.iter().find(|r| r.hint == hint) {
            return rule.family;
        }
    }

    let haystack = format!("{} {}", alertname, hint.unwrap_or("")).to_ascii_lowercase();
    for rule in RULES {
        if rule.keywords.iter().any(|kw| haystack.contains(kw)) {
            return rule.family;
        }
    }

    Family::Generic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playbook_hint_wins_over_keyword_overlap() {
        assert_eq!(detect_family("CPUThrottlingHigh", Some("cpu_throttling")), Family::CpuThrottling);
    }

    #[test]
    fn s1_cpu_throttling_by_keyword() {
        assert_eq!(detect_family("CPUThrottlingHigh", None), Family::CpuThrottling);
    }

    #[test]
    fn crashloop_keyword_match() {
        assert_eq!(detect_family("KubePodCrashLooping", None), Family::Crashloop);
    }

    #[test]
    fn unmatched_alert_is_generic() {
        assert_eq!(detect_family("SomeUnknownAlert", None), Family::Generic);
    }

    #[test]
    fn job_failed_keyword_match() {
        assert_eq!(detect_family("KubeJobFailed", None), Family::JobFailed);
    }
}
