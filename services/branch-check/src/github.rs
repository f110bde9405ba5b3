//! GitHub Checks API client
//!
//! [`CheckRunStore`] over the GitHub REST API, authenticated as an app
//! installation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::auth::InstallationTokenProvider;
use crate::check::{CheckRunEntry, ExistingCheckSummary, NewCheckRun};
use crate::error::GitHubApiError;
use crate::store::CheckRunStore;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "branch-check";
const API_VERSION: &str = "2022-11-28";

/// Headers every GitHub REST call carries
pub(crate) fn apply_default_headers(builder: RequestBuilder) -> RequestBuilder {
    builder
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", USER_AGENT)
        .header("X-GitHub-Api-Version", API_VERSION)
}

/// Turn a non-2xx response into [`GitHubApiError::Status`] carrying the body
pub(crate) async fn error_for_status(response: Response) -> Result<Response, GitHubApiError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(GitHubApiError::Status { status, body })
}

#[derive(Debug, Deserialize)]
struct CheckRunList {
    total_count: u64,
    check_runs: Vec<CheckRunEntry>,
}

pub struct GitHubChecksClient {
    http_client: Client,
    api_url: String,
    tokens: InstallationTokenProvider,
}

impl GitHubChecksClient {
    pub fn new(http_client: Client, api_url: &str, tokens: InstallationTokenProvider) -> Self {
        Self {
            http_client,
            api_url: api_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, GitHubApiError> {
        let token = self.tokens.token().await?;
        Ok(apply_default_headers(builder).bearer_auth(token))
    }
}

#[async_trait]
impl CheckRunStore for GitHubChecksClient {
    async fn list_check_runs(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
        check_name: &str,
    ) -> Result<ExistingCheckSummary, GitHubApiError> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}/check-runs",
            self.api_url, owner, repo, sha
        );

        let request = self
            .authorized(self.http_client.get(&url).query(&[("check_name", check_name)]))
            .await?;
        let response = error_for_status(request.send().await?).await?;

        let list = response
            .json::<CheckRunList>()
            .await
            .map_err(|e| GitHubApiError::Decode(e.to_string()))?;

        Ok(ExistingCheckSummary {
            count: list.total_count,
            entries: list.check_runs,
        })
    }

    async fn create_check_run(
        &self,
        owner: &str,
        repo: &str,
        run: &NewCheckRun,
    ) -> Result<(), GitHubApiError> {
        let url = format!("{}/repos/{}/{}/check-runs", self.api_url, owner, repo);

        let request = self.authorized(self.http_client.post(&url).json(run)).await?;
        error_for_status(request.send().await?).await?;

        Ok(())
    }
}
