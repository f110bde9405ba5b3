//! In-memory fakes (testing only)
//!
//! [`MemoryCheckRunStore`] keeps check runs in a `Vec` and records every call
//! so tests can assert on how many lookups and writes happened.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::check::{CheckRunEntry, ExistingCheckSummary, NewCheckRun};
use crate::error::GitHubApiError;
use crate::store::CheckRunStore;

/// A check run as stored by [`MemoryCheckRunStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCheckRun {
    pub owner: String,
    pub repo: String,
    pub run: NewCheckRun,
}

#[derive(Debug, Default)]
struct Inner {
    runs: Vec<StoredCheckRun>,
    list_calls: usize,
    create_calls: usize,
    fail_listing: bool,
    fail_creation: bool,
}

#[derive(Debug, Default)]
pub struct MemoryCheckRunStore {
    inner: Mutex<Inner>,
}

impl MemoryCheckRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing check run
    pub fn with_run(self, owner: &str, repo: &str, run: NewCheckRun) -> Self {
        self.inner.lock().unwrap().runs.push(StoredCheckRun {
            owner: owner.to_string(),
            repo: repo.to_string(),
            run,
        });
        self
    }

    /// Make every lookup fail with a 500
    pub fn failing_listing(self) -> Self {
        self.inner.lock().unwrap().fail_listing = true;
        self
    }

    /// Make every creation fail with a 422
    pub fn failing_creation(self) -> Self {
        self.inner.lock().unwrap().fail_creation = true;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    pub fn create_calls(&self) -> usize {
        self.inner.lock().unwrap().create_calls
    }

    /// Runs written through `create_check_run` or seeded with `with_run`
    pub fn runs(&self) -> Vec<StoredCheckRun> {
        self.inner.lock().unwrap().runs.clone()
    }
}

#[async_trait]
impl CheckRunStore for MemoryCheckRunStore {
    async fn list_check_runs(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        check_name: &str,
    ) -> Result<ExistingCheckSummary, GitHubApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;
        if inner.fail_listing {
            return Err(GitHubApiError::Status {
                status: 500,
                body: "listing unavailable".to_string(),
            });
        }

        let entries: Vec<CheckRunEntry> = inner
            .runs
            .iter()
            .enumerate()
            .filter(|(_, stored)| {
                stored.owner == owner
                    && stored.repo == repo
                    && stored.run.head_sha == sha
                    && stored.run.name == check_name
            })
            .map(|(i, stored)| CheckRunEntry {
                id: i as u64 + 1,
                name: stored.run.name.clone(),
                status: stored.run.status.as_str().to_string(),
                conclusion: Some(stored.run.conclusion.conclusion().to_string()),
            })
            .collect();

        Ok(ExistingCheckSummary {
            count: entries.len() as u64,
            entries,
        })
    }

    async fn create_check_run(
        &self,
        owner: &str,
        repo: &str,
        run: &NewCheckRun,
    ) -> Result<(), GitHubApiError> {
        let mut inner = self.inner.lock().unwrap();
        inner.create_calls += 1;
        if inner.fail_creation {
            return Err(GitHubApiError::Status {
                status: 422,
                body: "creation rejected".to_string(),
            });
        }

        inner.runs.push(StoredCheckRun {
            owner: owner.to_string(),
            repo: repo.to_string(),
            run: run.clone(),
        });
        Ok(())
    }
}
