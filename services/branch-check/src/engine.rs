//! Check Decision Engine
//!
//! For one [`CheckRequest`]: look up existing check runs of the configured
//! name on the commit, and if there are none, apply the branch policy and
//! record exactly one completed check run.
//!
//! The lookup and the write are two separate remote calls. Two deliveries for
//! the same commit that arrive together can both see zero runs and both
//! write; duplicate deliveries that arrive after the first write are
//! absorbed.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::check::{CheckOutcome, CheckRequest, NewCheckRun};
use crate::error::CheckError;
use crate::store::CheckRunStore;

/// What `evaluate` did for a request that succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// A check run of the configured name already existed; nothing written
    AlreadySatisfied,
    /// A new check run was created with this outcome
    Recorded(CheckOutcome),
}

/// Immutable after construction; share it behind an `Arc`.
pub struct CheckDecisionEngine<S> {
    store: Arc<S>,
    check_name: String,
}

impl<S: CheckRunStore> CheckDecisionEngine<S> {
    pub fn new(store: Arc<S>, check_name: impl Into<String>) -> Self {
        Self {
            store,
            check_name: check_name.into(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Decide and record the check run for `request`.
    ///
    /// Listing and creation failures are returned as-is; nothing is retried.
    #[instrument(
        skip(self, request),
        fields(
            owner = %request.owner(),
            repo = %request.repository(),
            sha = %request.commit_sha(),
        )
    )]
    pub async fn evaluate(&self, request: &CheckRequest) -> Result<Evaluation, CheckError> {
        let existing = self
            .store
            .list_check_runs(
                request.owner(),
                request.repository(),
                request.commit_sha(),
                &self.check_name,
            )
            .await
            .map_err(CheckError::CheckListingFailed)?;

        if !existing.is_empty() {
            for run in &existing.entries {
                info!(
                    name = %run.name,
                    id = run.id,
                    status = %run.status,
                    conclusion = run.conclusion.as_deref().unwrap_or(""),
                    "Checks found"
                );
            }
            info!(count = existing.count, "Check already recorded for commit, skipping");
            return Ok(Evaluation::AlreadySatisfied);
        }

        let outcome = CheckOutcome::for_branches(request.source_branch(), request.target_branch());
        let run = NewCheckRun::completed(
            self.check_name.as_str(),
            request.commit_sha(),
            outcome,
            Utc::now(),
        );

        self.store
            .create_check_run(request.owner(), request.repository(), &run)
            .await
            .map_err(CheckError::CheckCreationFailed)?;

        info!(
            source = %request.source_branch(),
            target = %request.target_branch(),
            conclusion = %outcome,
            "Check run recorded"
        );

        Ok(Evaluation::Recorded(outcome))
    }
}
