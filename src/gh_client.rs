use std::process::Stdio;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use prtriage_core::{CheckResult, Review, ReviewState};

use crate::event::PullRequest;

#[derive(Error, Debug)]
pub enum GithubClientError {
    #[error("Cannot find github cli binary in PATH")]
    CannotFindGithubCLI,
    #[error("Not logged into github cli, please use 'gh auth login'")]
    NotLoggedIn,
    #[error("Got unexpected exit status {code:?} from operation {operation}, stderr: {stderr}")]
    UnexpectedExitStatus {
        operation: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error(
        "Got unexpected output from operation {operation}, stdout: {stdout}, stderr: {stderr}, underlying error: {underlying_error}"
    )]
    UnexpectedOutput {
        operation: String,
        stderr: String,
        stdout: String,
        underlying_error: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Got unexpected io error when running {operation}: {underlying_error}")]
    UnexpectedCommandError {
        operation: String,
        underlying_error: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, GithubClientError>;

#[derive(Deserialize, Debug)]
struct RawAccount {
    id: u64,
}

#[derive(Deserialize, Debug)]
struct RawReview {
    user: RawAccount,
    state: ReviewState,
    submitted_at: Option<DateTime<Utc>>,
}

impl RawReview {
    fn convert_to_core(self) -> Option<Review> {
        // Unsubmitted pending reviews carry no timestamp and don't count.
        let submitted_at = self.submitted_at?;

        Some(Review {
            reviewer_id: self.user.id,
            state: self.state,
            submitted_at,
        })
    }
}

#[derive(Deserialize, Debug)]
struct RawCombinedStatus {
    statuses: Vec<CheckResult>,
}

#[derive(Deserialize, Debug)]
struct RawLabel {
    name: String,
}

#[derive(Serialize)]
struct ReplaceLabelsBody<'a> {
    labels: &'a [String],
}

pub struct GithubClient {}

impl GithubClient {
    pub async fn new() -> Result<GithubClient> {
        match Command::new("gh")
            .arg("auth")
            .arg("status")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(GithubClientError::CannotFindGithubCLI)
            }
            Err(e) => Err(GithubClientError::UnexpectedCommandError {
                operation: "gh auth status".to_string(),
                underlying_error: e,
            }),
            Ok(status) => match status.code() {
                Some(0) => Ok(GithubClient {}),
                Some(1) => Err(GithubClientError::NotLoggedIn),
                code => Err(GithubClientError::UnexpectedExitStatus {
                    operation: "gh auth status".to_string(),
                    code,
                    stderr: String::new(),
                }),
            },
        }
    }

    pub async fn open_prs_for_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<PullRequest>> {
        self.api_json(
            format!("gh api repos/{owner}/{repo}/pulls"),
            vec![format!(
                "repos/{owner}/{repo}/pulls?state=open&head={owner}:{branch}&per_page=100"
            )],
            None,
        )
        .await
    }

    pub async fn pull_request_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<Review>> {
        let raw_reviews: Vec<RawReview> = self
            .api_json(
                format!("gh api repos/{owner}/{repo}/pulls/{number}/reviews"),
                vec![format!(
                    "repos/{owner}/{repo}/pulls/{number}/reviews?per_page=100"
                )],
                None,
            )
            .await?;

        Ok(raw_reviews
            .into_iter()
            .filter_map(RawReview::convert_to_core)
            .collect())
    }

    pub async fn combined_status(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<CheckResult>> {
        let combined: RawCombinedStatus = self
            .api_json(
                format!("gh api repos/{owner}/{repo}/commits/{git_ref}/status"),
                vec![format!("repos/{owner}/{repo}/commits/{git_ref}/status")],
                None,
            )
            .await?;

        Ok(combined.statuses)
    }

    pub async fn issue_labels(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<String>> {
        let raw_labels: Vec<RawLabel> = self
            .api_json(
                format!("gh api repos/{owner}/{repo}/issues/{number}/labels"),
                vec![format!(
                    "repos/{owner}/{repo}/issues/{number}/labels?per_page=100"
                )],
                None,
            )
            .await?;

        Ok(raw_labels.into_iter().map(|label| label.name).collect())
    }

    pub async fn replace_labels(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        labels: &[String],
    ) -> Result<()> {
        let operation = format!("gh api -X PUT repos/{owner}/{repo}/issues/{number}/labels");

        let body = serde_json::to_vec(&ReplaceLabelsBody { labels }).map_err(|e| {
            GithubClientError::UnexpectedOutput {
                operation: operation.clone(),
                stderr: String::new(),
                stdout: String::new(),
                underlying_error: Box::new(e),
            }
        })?;

        // The response echoes the new label set; parsing it validates the
        // write went through.
        let _: Vec<RawLabel> = self
            .api_json(
                operation,
                vec![
                    "--method".to_string(),
                    "PUT".to_string(),
                    format!("repos/{owner}/{repo}/issues/{number}/labels"),
                    "--input".to_string(),
                    "-".to_string(),
                ],
                Some(body),
            )
            .await?;

        Ok(())
    }

    async fn api_json<T: DeserializeOwned>(
        &self,
        operation: String,
        args: Vec<String>,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        let output = self.run_api(&operation, args, body).await?;

        serde_json::from_slice(&output.stdout).map_err(|e| GithubClientError::UnexpectedOutput {
            operation,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            underlying_error: Box::new(e),
        })
    }

    async fn run_api(
        &self,
        operation: &str,
        args: Vec<String>,
        body: Option<Vec<u8>>,
    ) -> Result<std::process::Output> {
        let mut command = {
            let mut c = Command::new("gh");
            c.arg("api");
            for arg in &args {
                c.arg(arg);
            }
            c.stdin(if body.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
            c
        };

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => GithubClientError::CannotFindGithubCLI,
            _ => GithubClientError::UnexpectedCommandError {
                operation: operation.to_string(),
                underlying_error: e,
            },
        })?;

        if let Some(body) = body {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(&body).await.map_err(|e| {
                    GithubClientError::UnexpectedCommandError {
                        operation: operation.to_string(),
                        underlying_error: e,
                    }
                })?;
            }
        }

        let output =
            child
                .wait_with_output()
                .await
                .map_err(|e| GithubClientError::UnexpectedCommandError {
                    operation: operation.to_string(),
                    underlying_error: e,
                })?;

        if !output.status.success() {
            return Err(GithubClientError::UnexpectedExitStatus {
                operation: operation.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(output)
    }
}
