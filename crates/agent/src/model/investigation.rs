//! `Investigation`: the single SSOT value produced by one pipeline run
//! (spec.md §3 glossary). Immutable once returned; the pipeline mutates
//! a single in-flight builder internally.

use serde::Serialize;

use super::alert::AlertEvent;
use super::analysis::Analysis;
use super::evidence::Evidence;
use super::target::TargetRef;
use super::window::TimeWindow;

#[derive(Debug, Clone, Serialize)]
pub struct Investigation {
    pub alert: AlertEvent,
    pub window: TimeWindow,
    pub target: TargetRef,
    pub evidence: Evidence,
    pub analysis: Analysis,
    /// Append-only; every collector failure becomes a short
    /// `{subsystem}:{cause-code}` string here instead of raising (I4).
    pub errors: Vec<String>,
}

impl Investigation {
    #[must_use]
    pub fn new(alert: AlertEvent, window: TimeWindow) -> Self {
        Self {
            alert,
            window,
            target: TargetRef::default(),
            evidence: Evidence::default(),
            analysis: Analysis::default(),
            errors: Vec::new(),
        }
    }

    /// Append a collector failure in the `{subsystem}:{cause-code}`
    /// shape (spec.md §4.1 failure semantics, I4).
    pub fn record_error(&mut self, subsystem: &str, cause: impl std::fmt::Display) {
        self.errors.push(format!("{subsystem}:{cause}"));
    }

    /// Full JSON projection: includes raw evidence arrays (spec.md §6).
    #[must_use]
    pub fn to_full_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Analysis-only JSON projection: omits raw evidence arrays. The
    /// chat rerun tool returns only this projection (spec.md §6).
    #[must_use]
    pub fn to_analysis_json(&self) -> serde_json::Value {
        let reduced = AnalysisProjection {
            alert_fingerprint: &self.alert.fingerprint,
            window: &self.window,
            target: &self.target,
            analysis: &self.analysis,
            errors: &self.errors,
        };
        serde_json::to_value(&reduced).unwrap_or(serde_json::Value::Null)
    }
}

/// Reduced view type for the `analysis` projection, built independently
/// from `to_full_json` rather than via per-field `skip_serializing_if`
/// flags, so the two shapes can evolve independently (SPEC_FULL §3).
#[derive(Serialize)]
struct AnalysisProjection<'a> {
    alert_fingerprint: &'a str,
    window: &'a TimeWindow,
    target: &'a TargetRef,
    analysis: &'a Analysis,
    errors: &'a [String],
}
