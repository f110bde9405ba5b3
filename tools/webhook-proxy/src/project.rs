//! Proxy environment files
//!
//! `env.<name>.json` in the working directory describes where smee should
//! fetch deliveries from and where to forward them locally.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROXY_URL: &str = "https://smee.io/your-path";
pub const DEFAULT_LOCAL_PORT: u16 = 8080;
pub const DEFAULT_WEBHOOK_PATH: &str = "/github/webhook";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub webhook_proxy_url: String,
    pub local_port: u16,
    pub local_webhook_path: String,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            webhook_proxy_url: DEFAULT_PROXY_URL.to_string(),
            local_port: DEFAULT_LOCAL_PORT,
            local_webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
        }
    }
}

/// `env.<name>.json`, or `env.json` when the name is empty
pub fn env_file_name(env_name: &str) -> String {
    ["env", env_name, "json"]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}

pub fn env_file_path(work_dir: &Path, env_name: &str) -> PathBuf {
    work_dir.join(env_file_name(env_name))
}

/// Write a template env file and return its path
pub fn create_env_file(work_dir: &Path, env_name: &str) -> Result<PathBuf> {
    let path = env_file_path(work_dir, env_name);
    let content = serde_json::to_string_pretty(&Project::default())?;

    fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(path)
}

pub fn load_env_file(work_dir: &Path, env_name: &str) -> Result<Project> {
    let path = env_file_path(work_dir, env_name);
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| format!("Invalid project file {}", path.display()))
}
