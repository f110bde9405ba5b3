//! Check-run store port
//!
//! The two remote operations the decision engine depends on. The GitHub
//! implementation lives in [`crate::github`]; tests use
//! [`crate::fakes::MemoryCheckRunStore`].

use async_trait::async_trait;

use crate::check::{ExistingCheckSummary, NewCheckRun};
use crate::error::GitHubApiError;

#[async_trait]
pub trait CheckRunStore: Send + Sync {
    /// List check runs on `sha` whose name equals `check_name`
    async fn list_check_runs(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        check_name: &str,
    ) -> Result<ExistingCheckSummary, GitHubApiError>;

    /// Create a check run
    async fn create_check_run(
        &self,
        owner: &str,
        repo: &str,
        run: &NewCheckRun,
    ) -> Result<(), GitHubApiError>;
}
