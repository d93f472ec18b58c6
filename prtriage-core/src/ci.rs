use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CIStatus {
    Failure,
    Pending,
    Success,
}

impl CIStatus {
    pub fn parse(state: &str) -> Option<CIStatus> {
        match state {
            "failure" => Some(CIStatus::Failure),
            "pending" => Some(CIStatus::Pending),
            "success" => Some(CIStatus::Success),
            _ => None,
        }
    }
}

impl fmt::Display for CIStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CIStatus::Failure => write!(f, "failure"),
            CIStatus::Pending => write!(f, "pending"),
            CIStatus::Success => write!(f, "success"),
        }
    }
}

/// One named check out of a commit's combined status. The state is kept as
/// the raw API string so unrecognized values stay a diagnostic concern
/// rather than a parse failure.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CheckResult {
    pub context: String,
    pub state: String,
}

/// Reduces a commit's check results to a single verdict. A failure anywhere
/// wins immediately, a pending check outranks any success, and checks
/// outside a non-empty `required_checks` list are not consulted at all.
/// `None` means the checks had no opinion.
pub fn evaluate_ci(checks: &[CheckResult], required_checks: &[String]) -> Option<CIStatus> {
    let all_required = required_checks.is_empty();

    let mut verdict = None;

    for check in checks {
        if !all_required && !required_checks.contains(&check.context) {
            continue;
        }

        match CIStatus::parse(&check.state) {
            Some(CIStatus::Failure) => {
                return Some(CIStatus::Failure);
            }
            Some(CIStatus::Pending) => {
                if verdict != Some(CIStatus::Pending) {
                    verdict = Some(CIStatus::Pending);
                }
            }
            Some(CIStatus::Success) => {
                if verdict.is_none() {
                    verdict = Some(CIStatus::Success);
                }
            }
            None => {
                log::debug!(
                    "unknown status state {} encountered for context {}",
                    check.state,
                    check.context
                );
            }
        }
    }

    verdict
}
