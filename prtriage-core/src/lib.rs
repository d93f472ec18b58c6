pub mod ci;
pub mod labels;
pub mod review;
pub mod triage;

pub use ci::{evaluate_ci, CIStatus, CheckResult};
pub use labels::{apply_patch, label_patch, LabelPatch};
pub use review::{evaluate_reviews, Review, ReviewState, ReviewVerdict};
pub use triage::{classify, ClassifyInput, Todo, Triage};

/// Label groups and policy knobs for a single run. Built once at the
/// boundary and immutable afterwards.
#[derive(Clone, Debug, Default)]
pub struct TriageConfig {
    pub waiting_for_review_labels: Vec<String>,
    pub ready_for_merge_labels: Vec<String>,
    pub waiting_for_author_labels: Vec<String>,
    pub ci_passed_labels: Vec<String>,
    pub requires_description: bool,
    pub requires_review: bool,
    pub required_checks: Vec<String>,
}
