//! Stripping Kubernetes-generated suffixes from a workload name so it can
//! be matched against a service catalog or a naming-convention repo guess.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `(a)` combined Job-pod pattern: `<name>-<idx>-<idx>-<hash>`.
    static ref JOB_POD_PATTERN: Regex =
        Regex::new(r"^(.+)-\d+-\d+-[a-z0-9]{5,10}$").unwrap();
    /// `(c)` bare Job pattern: `<name>-<idx>-<idx>`.
    static ref JOB_PATTERN: Regex = Regex::new(r"^(.+)-\d+-\d+$").unwrap();
    /// `(d)` CronJob timestamp suffix: `<name>-<unix-ish timestamp>`.
    static ref CRONJOB_PATTERN: Regex = Regex::new(r"^(.+)-\d{8,10}$").unwrap();
}

/// Workload suffixes that naming-convention and service-catalog fuzzy
/// matching strip before retrying a lookup.
pub const KNOWN_WORKLOAD_SUFFIXES: &[&str] = &[
    "-job",
    "-worker",
    "-executor",
    "-handler",
    "-consumer",
    "-cron",
    "-batch",
];

fn has_vowel(s: &str) -> bool {
    s.chars().any(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
}

fn is_mixed_alpha_digit(s: &str) -> bool {
    let has_alpha = s.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = s.chars().any(|c| c.is_ascii_digit());
    has_alpha && has_digit
}

/// `(b)`: the last `-`-segment looks like a Kubernetes-generated hash if
/// it is 5-10 lowercase alphanumeric characters and either has no vowels
/// or mixes letters and digits.
fn is_probable_k8s_hash(segment: &str) -> bool {
    let len_ok = (5..=10).contains(&segment.len());
    let lowercase_alnum = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    len_ok && lowercase_alnum && (!has_vowel(segment) || is_mixed_alpha_digit(segment))
}

/// Strip Kubernetes pod/Job/CronJob generated suffixes from a workload
/// name, trying each rule in order and returning the first match.
/// Idempotent: `clean_workload_name(&clean_workload_name(n)) ==
/// clean_workload_name(n)` for all `n` (P7).
#[must_use]
pub fn clean_workload_name(name: &str) -> String {
    if let Some(caps) = JOB_POD_PATTERN.captures(name) {
        return caps[1].to_string();
    }

    if let Some((prefix, last)) = name.rsplit_once('-') {
        if is_probable_k8s_hash(last) {
            return prefix.to_string();
        }
    }

    if let Some(caps) = JOB_PATTERN.captures(name) {
        return caps[1].to_string();
    }

    if let Some(caps) = CRONJOB_PATTERN.captures(name) {
        return caps[1].to_string();
    }

    name.to_string()
}

/// Strip one well-known workload suffix (`-job`, `-worker`, ...) if the
/// name ends with it.
#[must_use]
pub fn strip_known_suffix(name: &str) -> Option<&str> {
    KNOWN_WORKLOAD_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_pod_pattern_keeps_capture_group() {
        assert_eq!(clean_workload_name("nightly-report-1-2-ab3de"), "nightly-report");
    }

    #[test]
    fn probable_hash_suffix_is_dropped() {
        assert_eq!(clean_workload_name("order-processing-7f9c8d"), "order-processing");
        // mixed alpha+digit, no vowel requirement needed
        assert_eq!(clean_workload_name("billing-a1b2c3"), "billing");
    }

    #[test]
    fn vowelly_short_suffix_is_kept() {
        // "alive" has vowels and is not alpha+digit mixed -> not a hash
        assert_eq!(clean_workload_name("billing-alive"), "billing-alive");
    }

    #[test]
    fn job_pattern_keeps_capture_group() {
        assert_eq!(clean_workload_name("migrate-0-1"), "migrate");
    }

    #[test]
    fn cronjob_timestamp_pattern_keeps_capture_group() {
        assert_eq!(clean_workload_name("cleanup-28394021"), "cleanup");
    }

    #[test]
    fn unrecognized_name_is_unchanged() {
        assert_eq!(clean_workload_name("order-processing-service"), "order-processing-service");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let samples = [
            "nightly-report-1-2-ab3de",
            "order-processing-7f9c8d",
            "migrate-0-1",
            "cleanup-28394021",
            "order-processing-service",
            "billing-alive",
        ];
        for sample in samples {
            let once = clean_workload_name(sample);
            let twice = clean_workload_name(&once);
            assert_eq!(once, twice, "cleaning {sample:?} is not idempotent");
        }
    }

    #[test]
    fn strip_known_suffix_matches_each_entry() {
        assert_eq!(strip_known_suffix("order-processing-executor"), Some("order-processing"));
        assert_eq!(strip_known_suffix("order-processing"), None);
    }
}
