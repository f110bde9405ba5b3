//! Service configuration
//!
//! Parsed once at startup from the command line, with environment fallbacks.
//!
//! ```bash
//! branch-check ./app.pem 123456 78901234
//!
//! GITHUB_PRIVATE_KEY_PATH=./app.pem \
//! GITHUB_APP_ID=123456 \
//! GITHUB_INSTALLATION_ID=78901234 \
//! GITHUB_WEBHOOK_SECRET=s3cret \
//! branch-check --port 3000
//! ```

use std::net::{IpAddr, SocketAddr};

use clap::Parser;

use crate::check::DEFAULT_CHECK_NAME;
use crate::github::DEFAULT_API_URL;

/// Records a release-branch policy check run on opened pull requests
#[derive(Parser, Debug, Clone)]
#[command(name = "branch-check")]
#[command(about = "GitHub App webhook service that records a release-branch policy check")]
#[command(version)]
pub struct Config {
    /// Path to the GitHub App private key PEM file
    #[arg(env = "GITHUB_PRIVATE_KEY_PATH")]
    pub private_key_path: String,

    /// GitHub App ID
    #[arg(env = "GITHUB_APP_ID")]
    pub app_id: u64,

    /// GitHub App installation ID
    #[arg(env = "GITHUB_INSTALLATION_ID")]
    pub installation_id: u64,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Shared secret for X-Hub-Signature-256 verification
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Name of the check run to record
    #[arg(long, env = "CHECK_NAME", default_value = DEFAULT_CHECK_NAME)]
    pub check_name: String,

    /// Timeout for each GitHub API call, in seconds
    #[arg(long, env = "GITHUB_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// Secret bytes, treating an empty value as unset
    pub fn webhook_secret_bytes(&self) -> Option<Vec<u8>> {
        self.webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_bytes().to_vec())
    }
}
