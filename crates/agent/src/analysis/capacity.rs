//! Capacity analysis (spec.md §4.1 stage 9: "for pod targets, run ...
//! capacity-analysis passes"). Derives CPU/memory utilization ratios
//! from the baseline usage series collected by `pod_baseline`, using
//! the same `metric=<name>` label convention
//! `analysis::features::compute_throttling_ratio` reads for the CPU
//! throttling ratio (SPEC_FULL §9 Open Question: the exact signal and
//! threshold are this implementation's own choice, see DESIGN.md).

use crate::model::analysis::CapacityAnalysis;
use crate::model::evidence::{LabelledSeries, MetricsEvidence};

const NEAR_LIMIT_THRESHOLD: f64 = 0.9;

fn last_value_for_metric(series: &[LabelledSeries], metric: &str) -> Option<f64> {
    series
        .iter()
        .find(|s| s.labels.get("metric").map(String::as_str) == Some(metric))
        .and_then(|s| s.samples.last())
        .map(|s| s.value)
}

fn utilization(series: &[LabelledSeries]) -> Option<f64> {
    let usage = last_value_for_metric(series, "usage")?;
    let limit = last_value_for_metric(series, "limit")?;
    if limit == 0.0 {
        None
    } else {
        Some(usage / limit)
    }
}

#[must_use]
pub fn analyze_capacity(metrics: Option<&MetricsEvidence>) -> CapacityAnalysis {
    let Some(metrics) = metrics else {
        return CapacityAnalysis::default();
    };
    let cpu_utilization_ratio = utilization(&metrics.cpu_usage);
    let memory_utilization_ratio = utilization(&metrics.memory_usage);
    let near_limit = cpu_utilization_ratio.is_some_and(|r| r >= NEAR_LIMIT_THRESHOLD)
        || memory_utilization_ratio.is_some_and(|r| r >= NEAR_LIMIT_THRESHOLD);
    CapacityAnalysis { cpu_utilization_ratio, memory_utilization_ratio, near_limit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn series(metric: &str, value: f64) -> LabelledSeries {
        let mut labels = HashMap::new();
        labels.insert("metric".to_string(), metric.to_string());
        LabelledSeries {
            labels,
            samples: vec![crate::model::evidence::MetricSample { timestamp: chrono::Utc::now(), value }],
        }
    }

    #[test]
    fn missing_metrics_yields_default() {
        let analysis = analyze_capacity(None);
        assert!(analysis.cpu_utilization_ratio.is_none());
        assert!(!analysis.near_limit);
    }

    #[test]
    fn computes_ratio_and_near_limit_flag() {
        let metrics =
            MetricsEvidence { cpu_usage: vec![series("usage", 0.95), series("limit", 1.0)], ..Default::default() };
        let analysis = analyze_capacity(Some(&metrics));
        assert_eq!(analysis.cpu_utilization_ratio, Some(0.95));
        assert!(analysis.near_limit);
    }

    #[test]
    fn zero_limit_is_not_a_ratio() {
        let metrics =
            MetricsEvidence { cpu_usage: vec![series("usage", 0.5), series("limit", 0.0)], ..Default::default() };
        let analysis = analyze_capacity(Some(&metrics));
        assert!(analysis.cpu_utilization_ratio.is_none());
    }
}
