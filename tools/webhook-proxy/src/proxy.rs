//! smee runner
//!
//! Spawns the smee client and forwards its output line by line into the
//! structured log. Output is drained until EOF whatever its encoding, so the
//! child never blocks on a full pipe.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

use crate::project::Project;

pub const SMEE_BINARY: &str = "smee";

pub fn smee_args(project: &Project) -> Vec<String> {
    vec![
        "--url".to_string(),
        project.webhook_proxy_url.clone(),
        "--port".to_string(),
        project.local_port.to_string(),
        "--path".to_string(),
        project.local_webhook_path.clone(),
    ]
}

/// Run `program` with the smee arguments until it exits
pub async fn run(program: &str, project: &Project) -> Result<()> {
    let mut child = Command::new(program)
        .args(smee_args(project))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("Failed to start {}", program))?;

    let stdout = child.stdout.take().context("child stdout not captured")?;
    let stderr = child.stderr.take().context("child stderr not captured")?;

    let (_, _, status) = tokio::join!(
        forward_lines("stdout", stdout),
        forward_lines("stderr", stderr),
        child.wait(),
    );

    let status = status.with_context(|| format!("Failed to wait for {}", program))?;
    if !status.success() {
        anyhow::bail!("{} exited with {}", program, status);
    }

    Ok(())
}

async fn forward_lines<R: AsyncRead + Unpin>(stream: &'static str, reader: R) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = trim_line_ending(&buf);
                info!(stream, contents = %String::from_utf8_lossy(line), "smee output");
                buf.clear();
            }
            Err(e) => {
                warn!(stream, error = %e, "Failed to read smee output");
                break;
            }
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
