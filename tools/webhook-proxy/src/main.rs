//! Webhook Proxy
//!
//! Local development helper for branch-check. Tunnels GitHub webhook
//! deliveries from a smee.io channel to the service running on localhost.
//!
//! ## Usage
//! ```bash
//! # Write env.dev.json with default settings, then edit WebhookProxyUrl
//! webhook-proxy gen env dev
//!
//! # Forward deliveries using env.dev.json (requires the `smee` client on PATH)
//! webhook-proxy webhook dev
//! ```

mod project;
mod proxy;

use std::env;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Webhook proxy for local development
#[derive(Parser, Debug)]
#[command(name = "webhook-proxy", version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate things
    Gen {
        #[command(subcommand)]
        target: GenTarget,
    },
    /// Run the webhook proxy
    Webhook {
        /// Environment name; reads env.<NAME>.json
        #[arg(default_value = "")]
        name: String,

        /// smee client executable
        #[arg(long, default_value = proxy::SMEE_BINARY, env = "SMEE_BINARY")]
        smee: String,
    },
}

#[derive(Subcommand, Debug)]
enum GenTarget {
    /// Write an env.<NAME>.json template in the working directory
    Env {
        #[arg(default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let work_dir = env::current_dir().context("Failed to get current working dir")?;

    match args.command {
        Command::Gen {
            target: GenTarget::Env { name },
        } => {
            let path = project::create_env_file(&work_dir, &name)?;
            info!(path = %path.display(), "Env file created");
        }
        Command::Webhook { name, smee } => {
            info!(
                work_dir = %work_dir.display(),
                env_file = %project::env_file_name(&name),
                "Loading configuration"
            );

            let project = project::load_env_file(&work_dir, &name)?;

            info!(
                webhook_proxy_url = %project.webhook_proxy_url,
                local_webhook_path = %project.local_webhook_path,
                local_port = project.local_port,
                "Loaded project configuration"
            );

            proxy::run(&smee, &project).await?;
        }
    }

    Ok(())
}
