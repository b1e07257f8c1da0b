//! Time window parsing and anchoring (spec.md §3 "Time window", §4.1
//! stage 2).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    /// The human expression as given, e.g. `"1h"`, `"30m"`, `"2h30m"`.
    pub expr: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Parse a duration expression of the form `<N>h<N>m<N>s` (any subset,
/// in that order), e.g. `"1h"`, `"30m"`, `"2h30m"`, `"45s"`.
#[must_use]
pub fn parse_duration_expr(expr: &str) -> Option<ChronoDuration> {
    let mut rest = expr.trim();
    if rest.is_empty() {
        return None;
    }
    let mut total = ChronoDuration::zero();
    let mut matched_any = false;
    for (suffix, to_duration) in [
        ('h', ChronoDuration::hours as fn(i64) -> ChronoDuration),
        ('m', ChronoDuration::minutes as fn(i64) -> ChronoDuration),
        ('s', ChronoDuration::seconds as fn(i64) -> ChronoDuration),
    ] {
        if let Some(idx) = rest.find(suffix) {
            let (num, remainder) = rest.split_at(idx);
            if let Ok(value) = num.parse::<i64>() {
                total += to_duration(value);
                matched_any = true;
            } else {
                return None;
            }
            rest = &remainder[1..];
        }
    }
    if matched_any && rest.is_empty() {
        Some(total)
    } else {
        None
    }
}

/// Anchor the time window (spec.md §4.1 stage 2, P2): if `alert_start`
/// is known, `end = alert_start`; else `end = now`. `start = end -
/// duration`.
#[must_use]
pub fn anchor_window(expr: &str, alert_start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> TimeWindow {
    let duration = parse_duration_expr(expr).unwrap_or_else(ChronoDuration::zero);
    let end = alert_start.unwrap_or(now);
    let start = end - duration;
    TimeWindow {
        expr: expr.to_string(),
        start,
        end,
    }
}
