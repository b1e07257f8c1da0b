//! Recent-change correlation (spec.md §4.1 stage 9: "for pod targets,
//! run change-analysis ... passes"). Pure: reads evidence already
//! collected by other stages, issues no new provider calls (spec.md
//! §4.6 "these are pure functions of the filled Evidence").
//!
//! `original_source/agent/pipeline/changes.py` was not part of the
//! retrieved source pack; the signals below (GitHub commit timestamps,
//! rollout replica counts) are this implementation's own choice of what
//! "recent change" means (SPEC_FULL §9 Open Question, see DESIGN.md).

use crate::model::analysis::ChangesAnalysis;
use crate::model::evidence::{GithubEvidence, RolloutStatus};
use crate::model::window::TimeWindow;

#[must_use]
pub fn analyze_changes(
    window: &TimeWindow,
    github: Option<&GithubEvidence>,
    rollout: Option<&RolloutStatus>,
) -> ChangesAnalysis {
    let mut analysis = ChangesAnalysis::default();

    if let Some(github) = github {
        analysis.commits_in_window = github
            .recent_commits
            .iter()
            .filter(|c| c.authored_at.is_some_and(|t| t >= window.start && t <= window.end))
            .count();
        if analysis.commits_in_window > 0 {
            analysis.recent_deploy_suspected = true;
            analysis
                .notes
                .push(format!("{} commit(s) landed inside the investigation window", analysis.commits_in_window));
        }
    }

    if let Some(rollout) = rollout {
        if rollout.updated_replicas > 0 && rollout.updated_replicas < rollout.desired_replicas {
            analysis.recent_deploy_suspected = true;
            analysis.notes.push("rollout in progress: updated replicas below desired".to_string());
        }
    }

    analysis
}
