//! Scoring, verdict, decision, and diagnostic hypotheses (spec.md §4.6,
//! §9 Open Question: schema beyond "deterministic, non-empty, bounded
//! [0,100]" is left to this implementation).

use crate::model::analysis::{Decision, FamilyEnrichment, Features, Hypothesis, Scores, Verdict};
use crate::model::evidence::CollectionStatus;
use crate::model::Family;

/// Impact/confidence scores, both bounded to `[0, 100]` (spec.md §4.6).
#[must_use]
pub fn compute_scores(features: &Features) -> Scores {
    let mut impact = 10.0;
    if let Some(rate) = features.restart_rate_5m_max {
        impact += (rate * 10.0).min(50.0);
    }
    if let Some(rate) = features.http_5xx_rate {
        impact += (rate * 100.0).min(30.0);
    }
    if features.pod_phase.as_deref() == Some("Failed") {
        impact += 20.0;
    }
    impact = impact.clamp(0.0, 100.0);

    let mut confidence = 30.0;
    if features.has_target {
        confidence += 30.0;
    }
    if matches!(features.logs_status, Some(CollectionStatus::Ok)) {
        confidence += 20.0;
    }
    if features.probe_failure_type.is_some() {
        confidence += 10.0;
    }
    if !features.last_terminated.is_empty() {
        confidence += 10.0;
    }
    confidence = confidence.clamp(0.0, 100.0);

    Scores { impact_score: impact, confidence_score: confidence }
}

/// The classification + one-liner summary (spec.md §4.6: "must be
/// non-empty for every run that reached this stage").
#[must_use]
pub fn compute_verdict(features: &Features, scores: &Scores) -> Verdict {
    let classification = if scores.impact_score >= 60.0 {
        "likely_incident"
    } else if scores.impact_score >= 30.0 {
        "possible_incident"
    } else {
        "low_impact"
    };

    let one_liner = format!(
        "{:?} alert, impact {:.0}/100, confidence {:.0}/100",
        features.family, scores.impact_score, scores.confidence_score
    );

    Verdict { classification: classification.to_string(), one_liner }
}

/// Build the family-specific decision from the enrichment (label + why
/// + next steps), the bullets a human reads first in the triage view.
#[must_use]
pub fn compute_decision(enrichment: &FamilyEnrichment) -> Decision {
    Decision {
        label: format!("{:?}", enrichment.label),
        why: enrichment.why.clone(),
        next_steps: enrichment.next_steps.clone(),
    }
}

/// Suggest hypotheses with confidence estimates and follow-up tests,
/// derived from the same features the enrichment pass reads.
#[must_use]
pub fn compute_hypotheses(features: &Features, family: Family) -> Vec<Hypothesis> {
    let mut hypotheses = Vec::new();

    if let Some(exit_code) = features.exit_code {
        hypotheses.push(Hypothesis {
            description: format!("container exits with code {exit_code}"),
            confidence: if exit_code == 137 { 0.8 } else { 0.5 },
            suggested_tests: vec!["check previous container logs for a stack trace".to_string()],
        });
    }

    if family == Family::CpuThrottling {
        if let Some(ratio) = features.throttling_ratio {
            hypotheses.push(Hypothesis {
                description: format!("CPU throttling ratio {ratio:.2}"),
                confidence: (ratio).clamp(0.0, 1.0),
                suggested_tests: vec!["raise CPU limits and observe throttling ratio".to_string()],
            });
        }
    }

    if hypotheses.is_empty() {
        hypotheses.push(Hypothesis {
            description: "insufficient evidence for a specific hypothesis".to_string(),
            confidence: 0.1,
            suggested_tests: vec!["gather more evidence via chat tools".to_string()],
        });
    }

    hypotheses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::analysis::Features;

    fn features() -> Features {
        Features {
            family: Family::Crashloop,
            pod_phase: Some("Running".into()),
            ready: Some(true),
            waiting_reason: None,
            container_waiting: vec![],
            last_terminated: vec![],
            recent_event_reasons: vec![],
            restart_rate_5m_max: Some(3.0),
            http_5xx_rate: None,
            logs_status: Some(CollectionStatus::Ok),
            probe_failure_type: None,
            crash_duration_seconds: None,
            exit_code: None,
            throttling_ratio: None,
            has_target: true,
        }
    }

    #[test]
    fn scores_are_bounded() {
        let scores = compute_scores(&features());
        assert!((0.0..=100.0).contains(&scores.impact_score));
        assert!((0.0..=100.0).contains(&scores.confidence_score));
    }

    #[test]
    fn verdict_is_never_empty() {
        let scores = compute_scores(&features());
        let verdict = compute_verdict(&features(), &scores);
        assert!(!verdict.classification.is_empty());
        assert!(!verdict.one_liner.is_empty());
    }

    #[test]
    fn hypotheses_never_empty() {
        let hypotheses = compute_hypotheses(&features(), Family::Crashloop);
        assert!(!hypotheses.is_empty());
    }
}
