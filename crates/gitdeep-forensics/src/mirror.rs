//! Scoped local mirrors of remote repositories.
//!
//! A [`LocalMirror`] owns a temporary clone. The directory is removed when
//! the mirror is dropped, so every exit path (success, parse failure,
//! timeout, panic unwinding) releases it.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use gitdeep_core::{GitdeepError, MiningConfig};
use tempfile::TempDir;
use tokio::process::Command;

use crate::mining::{parse_log, History, LOG_FORMAT};

/// A temporary clone used for history mining and duplication scanning.
#[derive(Debug)]
pub struct LocalMirror {
    dir: TempDir,
    log_timeout: Duration,
}

impl LocalMirror {
    /// Clone `url` into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`GitdeepError::Mirror`] if git cannot be spawned, exits
    /// unsuccessfully, or does not finish within `clone_timeout_secs`. The
    /// partially cloned directory is removed before returning.
    pub async fn acquire(url: &str, config: &MiningConfig) -> Result<Self, GitdeepError> {
        let dir = tempfile::Builder::new().prefix("gitdeep-").tempdir()?;
        tracing::debug!(url, path = %dir.path().display(), "cloning mirror");

        let mut clone = Command::new("git");
        clone
            .args(["clone", "--quiet", "--single-branch", "--no-tags", "--", url])
            .arg(dir.path())
            .env("GIT_TERMINAL_PROMPT", "0");

        run_git(
            clone,
            Duration::from_secs(config.clone_timeout_secs),
            "git clone",
        )
        .await?;

        Ok(Self {
            dir,
            log_timeout: Duration::from_secs(config.log_timeout_secs),
        })
    }

    /// Root of the checked-out working tree.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Read the full history as log text.
    ///
    /// # Errors
    ///
    /// Returns [`GitdeepError::Mirror`] if `git log` fails or times out.
    pub async fn log_text(&self) -> Result<String, GitdeepError> {
        let mut log = Command::new("git");
        // unquoted paths keep non-ASCII names byte-identical to the git2 miner
        log.args(["-c", "core.quotePath=false", "log", LOG_FORMAT, "--numstat"])
            .current_dir(self.dir.path());

        let stdout = run_git(log, self.log_timeout, "git log").await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Mine the mirror's history, newest first.
    ///
    /// Failures degrade to an empty history: callers treat that as "local
    /// data unavailable" rather than as an error.
    pub async fn history(&self) -> History {
        match self.log_text().await {
            Ok(text) => parse_log(&text),
            Err(err) => {
                tracing::warn!(error = %err, "local history unavailable");
                History::empty()
            }
        }
    }
}

/// Clone `url` and mine it, removing the clone before returning.
///
/// Any acquisition failure or timeout yields an empty history.
pub async fn mine_remote(url: &str, config: &MiningConfig) -> History {
    match LocalMirror::acquire(url, config).await {
        Ok(mirror) => mirror.history().await,
        Err(err) => {
            tracing::warn!(url, error = %err, "mirror acquisition failed");
            History::empty()
        }
    }
}

async fn run_git(
    mut command: Command,
    timeout: Duration,
    what: &str,
) -> Result<Vec<u8>, GitdeepError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command
        .spawn()
        .map_err(|e| GitdeepError::Mirror(format!("failed to spawn {what}: {e}")))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => {
            result.map_err(|e| GitdeepError::Mirror(format!("{what} failed: {e}")))?
        }
        Err(_) => {
            return Err(GitdeepError::Mirror(format!(
                "{what} timed out after {}s",
                timeout.as_secs()
            )))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitdeepError::Mirror(format!(
            "{what} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}
