//! Branch Check webhook service
//!
//! Composition root: parses configuration, loads the GitHub App key, wires the
//! Checks client into the decision engine and serves the webhook endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use branch_check::auth::{GitHubAppCredentials, InstallationTokenProvider};
use branch_check::github::GitHubChecksClient;
use branch_check::server::{self, AppState};
use branch_check::{CheckDecisionEngine, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = Config::parse();

    info!(
        app_id = config.app_id,
        installation_id = config.installation_id,
        check_name = %config.check_name,
        "Starting branch-check"
    );

    let credentials = GitHubAppCredentials::from_key_file(
        config.app_id,
        config.installation_id,
        &config.private_key_path,
    )
    .context("Failed to load GitHub App credentials")?;

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    let tokens = InstallationTokenProvider::new(credentials, http_client.clone(), &config.api_url);
    let checks = GitHubChecksClient::new(http_client, &config.api_url, tokens);
    let engine = CheckDecisionEngine::new(Arc::new(checks), config.check_name.clone());

    let webhook_secret = config.webhook_secret_bytes();
    if webhook_secret.is_none() {
        warn!("GITHUB_WEBHOOK_SECRET not set; signature verification disabled.");
    }

    let app = server::router(AppState::new(engine, webhook_secret));
    server::serve(config.listen_addr(), app).await
}
