//! Webhook Event Normalizer
//!
//! Decodes a GitHub webhook delivery once, at the HTTP boundary, into a
//! [`WebhookEvent`], and turns actionable pull request events into a
//! [`CheckRequest`]. No I/O happens here.

use serde::Deserialize;
use tracing::info;

use crate::check::CheckRequest;
use crate::error::CheckError;

/// Value of `X-GitHub-Event` for pull request deliveries
pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// `pull_request` webhook payload.
///
/// Fields are optional so a missing value is reported as a malformed event
/// naming the field rather than as a generic parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestEvent {
    pub action: Option<String>,
    pub pull_request: Option<PullRequestPayload>,
    pub repository: Option<RepositoryPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestPayload {
    pub number: Option<u64>,
    pub commits: Option<u64>,
    pub head: Option<BranchRef>,
    pub base: Option<BranchRef>,
}

/// Head or base of a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub ref_name: Option<String>,
    pub sha: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPayload {
    pub name: Option<String>,
    pub owner: Option<OwnerPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerPayload {
    pub login: Option<String>,
}

/// A webhook delivery, decoded once
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    PullRequestOpened(PullRequestEvent),
    PullRequestReopened(PullRequestEvent),
    /// Any other event type, or a pull request action we do not act on
    Other {
        event: String,
        action: Option<String>,
    },
}

impl WebhookEvent {
    /// Decode a delivery from its `X-GitHub-Event` value and raw body.
    pub fn decode(event_type: &str, body: &[u8]) -> Result<Self, CheckError> {
        if event_type != PULL_REQUEST_EVENT {
            return Ok(WebhookEvent::Other {
                event: event_type.to_string(),
                action: None,
            });
        }

        let payload: PullRequestEvent = serde_json::from_slice(body).map_err(|e| {
            CheckError::malformed(format!("invalid pull_request payload: {}", e))
        })?;

        let action = payload
            .action
            .clone()
            .ok_or_else(|| CheckError::malformed("pull_request payload has no action"))?;

        if let Some(pr) = &payload.pull_request {
            info!(
                action = %action,
                number = ?pr.number,
                commits = ?pr.commits,
                base_label = ?pr.base.as_ref().and_then(|b| b.label.as_deref()),
                "Pull request event"
            );
        }

        Ok(match action.as_str() {
            "opened" => WebhookEvent::PullRequestOpened(payload),
            "reopened" => WebhookEvent::PullRequestReopened(payload),
            _ => WebhookEvent::Other {
                event: event_type.to_string(),
                action: Some(action),
            },
        })
    }

    /// Produce a check request for opened/reopened pull requests.
    ///
    /// Returns `Ok(None)` when the event is not actionable. Fails with
    /// [`CheckError::MalformedEvent`] when an actionable event lacks a
    /// required field.
    pub fn normalize(&self) -> Result<Option<CheckRequest>, CheckError> {
        match self {
            WebhookEvent::PullRequestOpened(event) | WebhookEvent::PullRequestReopened(event) => {
                event.to_check_request().map(Some)
            }
            WebhookEvent::Other { .. } => Ok(None),
        }
    }
}

impl PullRequestEvent {
    fn to_check_request(&self) -> Result<CheckRequest, CheckError> {
        let repository = required(self.repository.as_ref(), "repository")?;
        let owner = required(
            repository.owner.as_ref().and_then(|o| o.login.as_deref()),
            "repository.owner.login",
        )?;
        let repo = required(repository.name.as_deref(), "repository.name")?;

        let pr = required(self.pull_request.as_ref(), "pull_request")?;
        let head = required(pr.head.as_ref(), "pull_request.head")?;
        let base = required(pr.base.as_ref(), "pull_request.base")?;

        CheckRequest::new(
            owner,
            repo,
            required(head.sha.as_deref(), "pull_request.head.sha")?,
            required(head.ref_name.as_deref(), "pull_request.head.ref")?,
            required(base.ref_name.as_deref(), "pull_request.base.ref")?,
        )
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, CheckError> {
    value.ok_or_else(|| CheckError::malformed(format!("missing {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(action: &str) -> serde_json::Value {
        json!({
            "action": action,
            "pull_request": {
                "number": 7,
                "commits": 3,
                "head": { "ref": "release/1.2", "sha": "deadbeef", "label": "octo:release/1.2" },
                "base": { "ref": "main", "sha": "cafebabe", "label": "octo:main" }
            },
            "repository": { "name": "widgets", "owner": { "login": "octo" } }
        })
    }

    fn decode(event: &str, body: &serde_json::Value) -> Result<WebhookEvent, CheckError> {
        WebhookEvent::decode(event, body.to_string().as_bytes())
    }

    #[test]
    fn test_opened_maps_fields() {
        let event = decode("pull_request", &payload("opened")).unwrap();
        assert!(matches!(event, WebhookEvent::PullRequestOpened(_)));

        let request = event.normalize().unwrap().unwrap();
        assert_eq!(request.owner(), "octo");
        assert_eq!(request.repository(), "widgets");
        assert_eq!(request.commit_sha(), "deadbeef");
        assert_eq!(request.source_branch(), "release/1.2");
        assert_eq!(request.target_branch(), "main");
    }

    #[test]
    fn test_reopened_is_actionable() {
        let event = decode("pull_request", &payload("reopened")).unwrap();
        assert!(matches!(event, WebhookEvent::PullRequestReopened(_)));
        assert!(event.normalize().unwrap().is_some());
    }

    #[test]
    fn test_other_actions_are_skipped() {
        for action in ["closed", "synchronize", "edited", "labeled"] {
            let event = decode("pull_request", &payload(action)).unwrap();
            match &event {
                WebhookEvent::Other { action: got, .. } => {
                    assert_eq!(got.as_deref(), Some(action))
                }
                other => panic!("unexpected variant {:?}", other),
            }
            assert!(event.normalize().unwrap().is_none());
        }
    }

    #[test]
    fn test_other_event_types_are_not_parsed() {
        let event = WebhookEvent::decode("ping", b"not json").unwrap();
        assert!(matches!(event, WebhookEvent::Other { event: ref event_type, .. } if event_type == "ping"));
        assert!(event.normalize().unwrap().is_none());
    }

    #[test]
    fn test_missing_head_sha_is_malformed() {
        let mut body = payload("opened");
        body["pull_request"]["head"]
            .as_object_mut()
            .unwrap()
            .remove("sha");

        let event = decode("pull_request", &body).unwrap();
        let err = event.normalize().unwrap_err();
        assert!(
            matches!(err, CheckError::MalformedEvent(ref msg) if msg.contains("pull_request.head.sha"))
        );
    }

    #[test]
    fn test_missing_fields_on_skipped_action_are_ignored() {
        let body = json!({ "action": "closed" });
        let event = decode("pull_request", &body).unwrap();
        assert!(event.normalize().unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = WebhookEvent::decode("pull_request", b"{").unwrap_err();
        assert!(matches!(err, CheckError::MalformedEvent(_)));
    }

    #[test]
    fn test_missing_action_is_malformed() {
        let mut body = payload("opened");
        body.as_object_mut().unwrap().remove("action");
        let err = decode("pull_request", &body).unwrap_err();
        assert!(matches!(err, CheckError::MalformedEvent(_)));
    }
}
