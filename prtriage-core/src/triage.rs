use std::fmt;

use crate::ci::CIStatus;
use crate::review::ReviewVerdict;
use crate::TriageConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Todo {
    WaitingOnReview,
    WaitingOnAuthor,
    WaitingOnDescription,
    ReadyForMerge,
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Todo::WaitingOnReview => write!(f, "waiting-on-review"),
            Todo::WaitingOnAuthor => write!(f, "waiting-on-author"),
            Todo::WaitingOnDescription => write!(f, "waiting-on-description"),
            Todo::ReadyForMerge => write!(f, "ready-for-merge"),
        }
    }
}

/// Classifier output. `todo` is `None` for events that carry no review
/// context (CI status events), `ci_status` is `None` when the checks had no
/// opinion or the PR is a draft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Triage {
    pub todo: Option<Todo>,
    pub ci_status: Option<CIStatus>,
}

pub struct ClassifyInput<'a> {
    pub draft: bool,
    /// False for events that map to PRs through branches rather than
    /// carrying one directly; those get a CI verdict but no todo.
    pub check_reviews: bool,
    /// The PR was just marked ready for review by its author.
    pub just_marked_ready: bool,
    pub pending_reviewer_count: usize,
    pub review_verdict: ReviewVerdict,
    pub body: Option<&'a str>,
}

/// Combines draft state, event shape, reviewer state and policy into one
/// verdict. Rules are evaluated in a fixed precedence order, earlier rules
/// win.
pub fn classify(input: &ClassifyInput, ci_status: Option<CIStatus>, cfg: &TriageConfig) -> Triage {
    // A draft is the author's to finish; no CI status is attached until the
    // PR leaves draft.
    if input.draft {
        return Triage {
            todo: Some(Todo::WaitingOnAuthor),
            ci_status: None,
        };
    }

    if !input.check_reviews {
        return Triage {
            todo: None,
            ci_status,
        };
    }

    let mut todo = if input.just_marked_ready || input.pending_reviewer_count > 0 {
        Todo::WaitingOnReview
    } else {
        match input.review_verdict {
            ReviewVerdict::Approved => Todo::ReadyForMerge,
            ReviewVerdict::NotApproved => Todo::WaitingOnReview,
            ReviewVerdict::NoReviews => {
                if cfg.requires_review {
                    Todo::WaitingOnReview
                } else {
                    Todo::ReadyForMerge
                }
            }
        }
    };

    if todo == Todo::ReadyForMerge
        && cfg.requires_description
        && input.body.map_or(true, str::is_empty)
    {
        todo = Todo::WaitingOnDescription;
    }

    Triage {
        todo: Some(todo),
        ci_status,
    }
}
