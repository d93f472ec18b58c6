use std::env;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

#[derive(Clone, Debug, Deserialize)]
pub struct Account {
    pub id: u64,
    pub login: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Repo {
    pub name: String,
    pub owner: Account,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GitRef {
    pub sha: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BaseRef {
    pub repo: Repo,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub draft: bool,
    pub body: Option<String>,
    pub user: Account,
    #[serde(default)]
    pub requested_reviewers: Vec<Account>,
    pub head: GitRef,
    pub base: BaseRef,
}

impl PullRequest {
    pub fn repo_owner(&self) -> &str {
        &self.base.repo.owner.login
    }

    pub fn repo_name(&self) -> &str {
        &self.base.repo.name
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// The subset of a webhook payload the hook reads. Status events carry
/// `context`/`state`/`branches`/`repository`, pull request events carry
/// `action` and the PR itself.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventPayload {
    pub action: Option<String>,
    pub pull_request: Option<PullRequest>,
    pub context: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub branches: Vec<Branch>,
    pub repository: Option<Repo>,
}

#[derive(Clone, Debug)]
pub struct Event {
    pub name: String,
    pub payload: EventPayload,
}

impl Event {
    pub async fn load(
        name_override: Option<String>,
        path_override: Option<PathBuf>,
    ) -> anyhow::Result<Event> {
        let name = name_override
            .or(env::var("GITHUB_EVENT_NAME").ok())
            .context("no event name given and GITHUB_EVENT_NAME is unset")?;

        let path = path_override
            .or(env::var("GITHUB_EVENT_PATH").ok().map(PathBuf::from))
            .context("no event payload path given and GITHUB_EVENT_PATH is unset")?;

        let mut payload_file = File::open(&path)
            .await
            .with_context(|| format!("could not open event payload at {}", path.display()))?;
        let mut payload_contents = vec![];
        payload_file.read_to_end(&mut payload_contents).await?;

        let payload = serde_json::from_slice(&payload_contents)
            .with_context(|| format!("could not parse event payload at {}", path.display()))?;

        Ok(Event { name, payload })
    }

    /// The lifecycle transition out of draft. Review state is deliberately
    /// not consulted for this transition; the PR always goes back to
    /// waiting on review.
    pub fn just_marked_ready(&self) -> bool {
        self.name == "pull_request" && self.payload.action.as_deref() == Some("ready_for_review")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(payload: &str) -> EventPayload {
        serde_json::from_str(payload).unwrap()
    }

    #[test]
    fn pull_request_payload_parses() {
        let payload = parse(
            r#"{
                "action": "ready_for_review",
                "pull_request": {
                    "number": 7,
                    "draft": false,
                    "body": "fixes a bug",
                    "user": { "id": 99, "login": "author" },
                    "requested_reviewers": [{ "id": 3, "login": "reviewer" }],
                    "head": { "sha": "abc123" },
                    "base": {
                        "repo": {
                            "name": "widget",
                            "owner": { "id": 1, "login": "acme" }
                        }
                    }
                }
            }"#,
        );

        let pr = payload.pull_request.unwrap();
        assert_eq!(pr.number, 7);
        assert!(!pr.draft);
        assert_eq!(pr.user.id, 99);
        assert_eq!(pr.requested_reviewers.len(), 1);
        assert_eq!(pr.repo_owner(), "acme");
        assert_eq!(pr.repo_name(), "widget");
    }

    #[test]
    fn missing_optional_pr_fields_default() {
        let payload = parse(
            r#"{
                "pull_request": {
                    "number": 7,
                    "body": null,
                    "user": { "id": 99, "login": "author" },
                    "head": { "sha": "abc123" },
                    "base": {
                        "repo": {
                            "name": "widget",
                            "owner": { "id": 1, "login": "acme" }
                        }
                    }
                }
            }"#,
        );

        let pr = payload.pull_request.unwrap();
        assert!(!pr.draft);
        assert_eq!(pr.body, None);
        assert!(pr.requested_reviewers.is_empty());
    }

    #[test]
    fn status_payload_parses() {
        let payload = parse(
            r#"{
                "context": "ci/build",
                "state": "success",
                "branches": [{ "name": "main" }, { "name": "feature" }],
                "repository": {
                    "name": "widget",
                    "owner": { "id": 1, "login": "acme" }
                }
            }"#,
        );

        assert_eq!(payload.context.as_deref(), Some("ci/build"));
        assert_eq!(payload.state.as_deref(), Some("success"));
        assert_eq!(payload.branches.len(), 2);
        assert_eq!(payload.repository.unwrap().name, "widget");
    }

    #[test]
    fn ready_for_review_transition_is_detected() {
        let event = Event {
            name: "pull_request".to_string(),
            payload: EventPayload {
                action: Some("ready_for_review".to_string()),
                ..EventPayload::default()
            },
        };
        assert!(event.just_marked_ready());

        let event = Event {
            name: "pull_request_review".to_string(),
            payload: EventPayload {
                action: Some("ready_for_review".to_string()),
                ..EventPayload::default()
            },
        };
        assert!(!event.just_marked_ready());

        let event = Event {
            name: "pull_request".to_string(),
            payload: EventPayload {
                action: Some("synchronize".to_string()),
                ..EventPayload::default()
            },
        };
        assert!(!event.just_marked_ready());
    }
}
