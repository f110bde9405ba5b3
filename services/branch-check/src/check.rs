//! Check Types
//!
//! Value objects shared by the normalizer, the decision engine and the
//! GitHub Checks client, plus the branch policy itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// Name of the check run when none is configured
pub const DEFAULT_CHECK_NAME: &str = "Custom Check";

/// Only pull requests into this branch can pass
pub const PROTECTED_BRANCH: &str = "main";

/// Source branches that may merge into [`PROTECTED_BRANCH`]
pub const RELEASE_PREFIX: &str = "release/";

/// Everything the decision engine needs to know about one pull request event.
///
/// Built once per delivery by the normalizer and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    owner: String,
    repository: String,
    commit_sha: String,
    source_branch: String,
    target_branch: String,
}

impl CheckRequest {
    /// Build a request, rejecting empty owner, repository or commit SHA.
    pub fn new(
        owner: impl Into<String>,
        repository: impl Into<String>,
        commit_sha: impl Into<String>,
        source_branch: impl Into<String>,
        target_branch: impl Into<String>,
    ) -> Result<Self, CheckError> {
        let request = Self {
            owner: owner.into(),
            repository: repository.into(),
            commit_sha: commit_sha.into(),
            source_branch: source_branch.into(),
            target_branch: target_branch.into(),
        };

        for (field, value) in [
            ("repository owner", &request.owner),
            ("repository name", &request.repository),
            ("head sha", &request.commit_sha),
        ] {
            if value.is_empty() {
                return Err(CheckError::malformed(format!("{} is empty", field)));
            }
        }

        Ok(request)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }

    pub fn source_branch(&self) -> &str {
        &self.source_branch
    }

    pub fn target_branch(&self) -> &str {
        &self.target_branch
    }
}

/// Result of the branch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckOutcome {
    Success,
    Failure,
}

impl CheckOutcome {
    /// Apply the branch policy: a `release/*` branch into `main` passes,
    /// anything else fails.
    pub fn for_branches(source_branch: &str, target_branch: &str) -> Self {
        if target_branch == PROTECTED_BRANCH && source_branch.starts_with(RELEASE_PREFIX) {
            CheckOutcome::Success
        } else {
            CheckOutcome::Failure
        }
    }

    /// Value of the check run `conclusion` field
    pub fn conclusion(self) -> &'static str {
        match self {
            CheckOutcome::Success => "success",
            CheckOutcome::Failure => "failure",
        }
    }
}

impl std::fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.conclusion())
    }
}

/// Status of a created check run; runs are only ever written completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Completed,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Completed => "completed",
        }
    }
}

/// One check run already attached to a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunEntry {
    pub id: u64,
    pub name: String,
    pub status: String,
    /// `None` while the run is still in progress
    pub conclusion: Option<String>,
}

/// Result of looking up check runs for a commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingCheckSummary {
    pub count: u64,
    pub entries: Vec<CheckRunEntry>,
}

impl ExistingCheckSummary {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Body of a check-run creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: CheckStatus,
    pub conclusion: CheckOutcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl NewCheckRun {
    /// A run that is created already resolved; start and end are the same instant.
    pub fn completed(
        name: impl Into<String>,
        head_sha: impl Into<String>,
        conclusion: CheckOutcome,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            head_sha: head_sha.into(),
            status: CheckStatus::Completed,
            conclusion,
            started_at: at,
            completed_at: at,
        }
    }
}
