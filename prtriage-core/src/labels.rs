use std::collections::HashSet;

use crate::ci::CIStatus;
use crate::triage::{Todo, Triage};
use crate::TriageConfig;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelPatch {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

/// Maps a triage verdict to the label additions and removals that reflect
/// it. The three todo groups are mutually exclusive; the ci-passed group is
/// an overlay that is present exactly when CI succeeded.
pub fn label_patch(triage: &Triage, cfg: &TriageConfig) -> LabelPatch {
    let (mut to_remove, mut to_add) = match triage.todo {
        Some(Todo::ReadyForMerge) => (
            [
                cfg.waiting_for_review_labels.clone(),
                cfg.waiting_for_author_labels.clone(),
            ]
            .concat(),
            cfg.ready_for_merge_labels.clone(),
        ),
        Some(Todo::WaitingOnReview) => (
            [
                cfg.ready_for_merge_labels.clone(),
                cfg.waiting_for_author_labels.clone(),
            ]
            .concat(),
            cfg.waiting_for_review_labels.clone(),
        ),
        Some(Todo::WaitingOnAuthor) | Some(Todo::WaitingOnDescription) => (
            [
                cfg.ready_for_merge_labels.clone(),
                cfg.waiting_for_review_labels.clone(),
            ]
            .concat(),
            cfg.waiting_for_author_labels.clone(),
        ),
        None => (vec![], vec![]),
    };

    match triage.ci_status {
        Some(CIStatus::Success) => to_add.extend(cfg.ci_passed_labels.iter().cloned()),
        _ => to_remove.extend(cfg.ci_passed_labels.iter().cloned()),
    }

    LabelPatch { to_add, to_remove }
}

/// Applies a patch to the live label set: removals first, then additions,
/// so a label in both sets ends up present. Returns `None` when the result
/// equals the live set as a set, meaning no write must be issued.
pub fn apply_patch(current: &[String], patch: &LabelPatch) -> Option<Vec<String>> {
    let mut next = Vec::new();

    for label in current {
        if !patch.to_remove.contains(label) {
            next.push(label.clone());
        }
    }

    for add in &patch.to_add {
        if !next.contains(add) {
            next.push(add.clone());
        }
    }

    let before: HashSet<&str> = current.iter().map(String::as_str).collect();
    let after: HashSet<&str> = next.iter().map(String::as_str).collect();

    if before == after {
        None
    } else {
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TriageConfig {
        TriageConfig {
            waiting_for_review_labels: labels(&["needs-review"]),
            ready_for_merge_labels: labels(&["ready"]),
            waiting_for_author_labels: labels(&["needs-work"]),
            ci_passed_labels: labels(&["ci-passed"]),
            ..TriageConfig::default()
        }
    }

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn triage(todo: Option<Todo>, ci_status: Option<CIStatus>) -> Triage {
        Triage { todo, ci_status }
    }

    #[test]
    fn ready_for_merge_swaps_out_the_other_groups() {
        let patch = label_patch(&triage(Some(Todo::ReadyForMerge), Some(CIStatus::Success)), &cfg());

        assert_eq!(patch.to_remove, labels(&["needs-review", "needs-work"]));
        assert_eq!(patch.to_add, labels(&["ready", "ci-passed"]));
    }

    #[test]
    fn waiting_on_review_swaps_out_the_other_groups() {
        let patch = label_patch(&triage(Some(Todo::WaitingOnReview), Some(CIStatus::Pending)), &cfg());

        assert_eq!(patch.to_remove, labels(&["ready", "needs-work", "ci-passed"]));
        assert_eq!(patch.to_add, labels(&["needs-review"]));
    }

    #[test]
    fn author_and_description_share_a_mapping() {
        for todo in [Todo::WaitingOnAuthor, Todo::WaitingOnDescription] {
            let patch = label_patch(&triage(Some(todo), None), &cfg());

            assert_eq!(patch.to_remove, labels(&["ready", "needs-review", "ci-passed"]));
            assert_eq!(patch.to_add, labels(&["needs-work"]));
        }
    }

    #[test]
    fn no_todo_only_adjusts_the_ci_overlay() {
        let patch = label_patch(&triage(None, Some(CIStatus::Success)), &cfg());
        assert_eq!(patch.to_remove, Vec::<String>::new());
        assert_eq!(patch.to_add, labels(&["ci-passed"]));

        let patch = label_patch(&triage(None, Some(CIStatus::Failure)), &cfg());
        assert_eq!(patch.to_remove, labels(&["ci-passed"]));
        assert_eq!(patch.to_add, Vec::<String>::new());
    }

    #[test]
    fn apply_removes_then_adds() {
        let patch = LabelPatch {
            to_add: labels(&["ready"]),
            to_remove: labels(&["needs-review"]),
        };

        let next = apply_patch(&labels(&["needs-review", "bug"]), &patch);

        assert_eq!(next, Some(labels(&["bug", "ready"])));
    }

    #[test]
    fn applying_twice_changes_nothing_more() {
        let patch = LabelPatch {
            to_add: labels(&["ready"]),
            to_remove: labels(&["needs-review"]),
        };

        let next = apply_patch(&labels(&["needs-review", "bug"]), &patch).unwrap();

        assert_eq!(apply_patch(&next, &patch), None);
    }

    #[test]
    fn add_wins_when_a_label_is_in_both_sets() {
        let patch = LabelPatch {
            to_add: labels(&["ready"]),
            to_remove: labels(&["ready"]),
        };

        // Already present: stays present, no write needed.
        assert_eq!(apply_patch(&labels(&["ready"]), &patch), None);

        // Absent: the addition wins over the removal.
        assert_eq!(apply_patch(&[], &patch), Some(labels(&["ready"])));
    }

    #[test]
    fn no_op_when_labels_already_match() {
        let patch = LabelPatch {
            to_add: labels(&["ready"]),
            to_remove: labels(&["needs-review", "needs-work"]),
        };

        assert_eq!(apply_patch(&labels(&["ready", "bug"]), &patch), None);
    }

    #[test]
    fn unrelated_labels_are_left_alone() {
        let patch = label_patch(&triage(Some(Todo::WaitingOnAuthor), None), &cfg());

        let next = apply_patch(&labels(&["needs-review", "ci-passed", "bug"]), &patch);

        assert_eq!(next, Some(labels(&["bug", "needs-work"])));
    }
}
