use anyhow::bail;
use log::{debug, error, info};

use prtriage_core::{
    apply_patch, classify, evaluate_ci, evaluate_reviews, label_patch, ClassifyInput, LabelPatch,
    ReviewVerdict, Todo, Triage, TriageConfig,
};

use crate::event::{Event, PullRequest};
use crate::gh_client::{GithubClient, GithubClientError};

pub struct TriageReport {
    pub number: u64,
    pub triage: Triage,
    pub labels_changed: bool,
}

pub struct PrFailure {
    pub number: u64,
    pub error: GithubClientError,
}

#[derive(Default)]
pub struct ProcessOutcome {
    pub reports: Vec<TriageReport>,
    pub failures: Vec<PrFailure>,
}

impl ProcessOutcome {
    pub fn missing_description(&self) -> bool {
        self.reports
            .iter()
            .any(|report| report.triage.todo == Some(Todo::WaitingOnDescription))
    }
}

async fn on_status_event(
    event: &Event,
    client: &GithubClient,
    cfg: &TriageConfig,
) -> Result<Vec<PullRequest>, GithubClientError> {
    // Statuses for contexts outside the allow-list can't change the verdict.
    if !cfg.required_checks.is_empty() {
        match &event.payload.context {
            Some(context) if cfg.required_checks.contains(context) => {}
            context => {
                info!(
                    "ignoring status event {:?} for context {:?}",
                    event.payload.state, context
                );
                return Ok(vec![]);
            }
        }
    }

    let Some(repo) = &event.payload.repository else {
        info!(
            "ignoring status event for {:?}, no repository found",
            event.payload.context
        );
        return Ok(vec![]);
    };

    if event.payload.branches.is_empty() {
        info!(
            "ignoring status event for {:?}, no branches found",
            event.payload.context
        );
        return Ok(vec![]);
    }

    let mut pull_requests = vec![];

    for branch in &event.payload.branches {
        let branch_prs = client
            .open_prs_for_branch(&repo.owner.login, &repo.name, &branch.name)
            .await?;

        pull_requests.extend(branch_prs);
    }

    Ok(pull_requests)
}

/// Processes one triggering event end to end: resolve the affected PRs,
/// classify each one, and reconcile its labels. PRs are handled
/// sequentially and independently; a collaborator failure on one PR is
/// recorded and the remaining PRs still get processed.
pub async fn process_event(
    event: &Event,
    client: &GithubClient,
    cfg: &TriageConfig,
    dry_run: bool,
) -> anyhow::Result<ProcessOutcome> {
    let mut check_reviews = false;
    let mut pull_requests = vec![];

    if event.name == "status" {
        pull_requests = on_status_event(event, client, cfg).await?;
    } else if let Some(pr) = &event.payload.pull_request {
        check_reviews = true;
        pull_requests.push(pr.clone());
    } else if event.name.starts_with("pull_request") {
        bail!("event {} carried no pull request in its payload", event.name);
    } else {
        info!(
            "event {} didn't pertain to 1 or more pull requests, ignoring",
            event.name
        );
        return Ok(ProcessOutcome::default());
    }

    if pull_requests.is_empty() {
        info!(
            "event {} didn't pertain to 1 or more pull requests, ignoring",
            event.name
        );
        return Ok(ProcessOutcome::default());
    }

    let mut outcome = ProcessOutcome::default();

    for pr in pull_requests {
        match triage_pull_request(client, event, cfg, &pr, check_reviews, dry_run).await {
            Ok(report) => outcome.reports.push(report),
            Err(e) => {
                error!("failed to triage PR#{}: {}", pr.number, e);
                outcome.failures.push(PrFailure {
                    number: pr.number,
                    error: e,
                });
            }
        }
    }

    Ok(outcome)
}

async fn triage_pull_request(
    client: &GithubClient,
    event: &Event,
    cfg: &TriageConfig,
    pr: &PullRequest,
    check_reviews: bool,
    dry_run: bool,
) -> Result<TriageReport, GithubClientError> {
    let just_marked_ready = event.just_marked_ready();

    let ci_status = if pr.draft {
        info!("PR#{} is a draft, skipping its checks", pr.number);
        None
    } else {
        let checks = client
            .combined_status(pr.repo_owner(), pr.repo_name(), &pr.head.sha)
            .await?;
        let ci_status = evaluate_ci(&checks, &cfg.required_checks);
        debug!("CI status for PR#{} is {:?}", pr.number, ci_status);
        ci_status
    };

    // Reviews are only fetched when the verdict can depend on them; the
    // earlier precedence rules decide without a review verdict.
    let review_verdict = if check_reviews
        && !pr.draft
        && !just_marked_ready
        && pr.requested_reviewers.is_empty()
    {
        let reviews = client
            .pull_request_reviews(pr.repo_owner(), pr.repo_name(), pr.number)
            .await?;
        let verdict = evaluate_reviews(&reviews, pr.user.id);
        debug!("review verdict for PR#{} is {:?}", pr.number, verdict);
        verdict
    } else {
        if !pr.requested_reviewers.is_empty() {
            debug!(
                "PR#{} has {} pending reviewers",
                pr.number,
                pr.requested_reviewers.len()
            );
        }
        ReviewVerdict::NoReviews
    };

    let triage = classify(
        &ClassifyInput {
            draft: pr.draft,
            check_reviews,
            just_marked_ready,
            pending_reviewer_count: pr.requested_reviewers.len(),
            review_verdict,
            body: pr.body.as_deref(),
        },
        ci_status,
        cfg,
    );

    info!(
        "PR#{} triaged to todo {:?}, ci {:?}",
        pr.number, triage.todo, triage.ci_status
    );

    let patch = label_patch(&triage, cfg);
    let labels_changed = sync_pr_labels(client, pr, &patch, dry_run).await?;

    Ok(TriageReport {
        number: pr.number,
        triage,
        labels_changed,
    })
}

async fn sync_pr_labels(
    client: &GithubClient,
    pr: &PullRequest,
    patch: &LabelPatch,
    dry_run: bool,
) -> Result<bool, GithubClientError> {
    debug!(
        "PR#{} adding labels {:?}, removing labels {:?}",
        pr.number, patch.to_add, patch.to_remove
    );

    // The labels on the PR may have changed since the workflow was
    // triggered; the diff has to run against what is on the PR right now or
    // labels added in the meantime would get clobbered.
    let current_labels = client
        .issue_labels(pr.repo_owner(), pr.repo_name(), pr.number)
        .await?;

    match apply_patch(&current_labels, patch) {
        Some(next_labels) => {
            debug!(
                "PR#{} changing labels from {:?} to {:?}",
                pr.number, current_labels, next_labels
            );

            if dry_run {
                info!("dry run, not writing labels for PR#{}", pr.number);
            } else {
                client
                    .replace_labels(pr.repo_owner(), pr.repo_name(), pr.number, &next_labels)
                    .await?;
            }

            Ok(true)
        }
        None => {
            info!("no labels to change for PR#{}", pr.number);
            Ok(false)
        }
    }
}
