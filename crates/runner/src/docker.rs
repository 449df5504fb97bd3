//! Docker command execution utilities

use std::ffi::OsString;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Result, RunnerError};

/// Output from a captured docker command
#[derive(Debug)]
pub struct DockerOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// How an inherited-stdio docker command ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The child exited on its own with this code
    Completed(i32),
    /// The cancellation signal fired and the child was killed
    Cancelled,
}

/// Thin wrapper around the `docker` binary.
///
/// The program path is configurable so tests can point at a stub
/// executable instead of a live daemon.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: OsString,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: OsString::from("docker"),
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific docker binary
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Execute a docker command, capturing output
    pub async fn run(&self, args: &[&str]) -> Result<DockerOutput> {
        debug!("Running docker {:?}", args);

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RunnerError::Docker(format!("Failed to execute docker: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        trace!("docker stdout: {}", stdout);
        if !stderr.is_empty() {
            trace!("docker stderr: {}", stderr);
        }

        Ok(DockerOutput {
            stdout,
            stderr,
            success: output.status.success(),
        })
    }

    /// Execute a docker command and fail on a non-zero exit
    pub async fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.success {
            return Err(RunnerError::Docker(format!(
                "docker {} failed: {}",
                args.join(" "),
                output.stderr.trim()
            )));
        }
        Ok(output.stdout)
    }

    /// Execute a docker command with stdio inherited from this process.
    ///
    /// Output streams straight to the user's terminal, line-for-line and
    /// unparsed. The command runs until the child exits or `cancel`
    /// fires, in which case the child is killed.
    pub async fn inherit(&self, args: &[&str], cancel: &CancellationToken) -> Result<ExitOutcome> {
        debug!("Running docker {:?} with inherited stdio", args);

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RunnerError::Docker(format!("Failed to execute docker: {}", e)))?;

        tokio::select! {
            status = child.wait() => {
                let code = status?.code().unwrap_or(-1);
                Ok(ExitOutcome::Completed(code))
            }
            _ = cancel.cancelled() => {
                debug!("Cancellation requested, killing docker child");
                child.kill().await?;
                Ok(ExitOutcome::Cancelled)
            }
        }
    }

    /// Whether the daemon runs rootless, from `docker info -f json`
    /// (`SecurityOptions` mentions `rootless`).
    pub async fn is_rootless(&self) -> Result<bool> {
        let stdout = self.run_checked(&["info", "-f", "json"]).await?;
        let info: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(|e| RunnerError::Docker(format!("Failed to parse docker info: {}", e)))?;

        let rootless = info
            .get("SecurityOptions")
            .and_then(|v| v.as_array())
            .map(|options| {
                options
                    .iter()
                    .filter_map(|o| o.as_str())
                    .any(|o| o.contains("rootless"))
            })
            .unwrap_or(false);
        Ok(rootless)
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use std::path::{Path, PathBuf};

    /// Write an executable stub script that stands in for `docker`
    pub fn write_stub(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("docker");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::stub::write_stub;
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_captures_output() {
        let dir = TempDir::new().unwrap();
        let program = write_stub(dir.path(), r#"echo "hello from stub""#);

        let cli = DockerCli::with_program(program);
        let output = cli.run(&["logs", "abc"]).await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello from stub\n");
    }

    #[tokio::test]
    async fn test_run_checked_failure() {
        let dir = TempDir::new().unwrap();
        let program = write_stub(dir.path(), r#"echo "boom" >&2; exit 1"#);

        let cli = DockerCli::with_program(program);
        let err = cli.run_checked(&["ps"]).await.unwrap_err();
        assert!(matches!(err, RunnerError::Docker(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let cli = DockerCli::with_program("/nonexistent/docker-binary");
        assert!(matches!(
            cli.run(&["info"]).await,
            Err(RunnerError::Docker(_))
        ));
    }

    #[tokio::test]
    async fn test_is_rootless_true() {
        let dir = TempDir::new().unwrap();
        let program = write_stub(
            dir.path(),
            r#"echo '{"SecurityOptions":["name=seccomp,profile=builtin","name=rootless"]}'"#,
        );

        let cli = DockerCli::with_program(program);
        assert!(cli.is_rootless().await.unwrap());
    }

    #[tokio::test]
    async fn test_is_rootless_false() {
        let dir = TempDir::new().unwrap();
        let program = write_stub(
            dir.path(),
            r#"echo '{"SecurityOptions":["name=seccomp,profile=builtin"]}'"#,
        );

        let cli = DockerCli::with_program(program);
        assert!(!cli.is_rootless().await.unwrap());
    }

    #[tokio::test]
    async fn test_inherit_reports_exit_code() {
        let dir = TempDir::new().unwrap();
        let program = write_stub(dir.path(), "exit 3");

        let cli = DockerCli::with_program(program);
        let cancel = CancellationToken::new();
        let outcome = cli.inherit(&["logs", "-f", "abc"], &cancel).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Completed(3));
    }

    #[tokio::test]
    async fn test_inherit_cancellation_kills_child() {
        let dir = TempDir::new().unwrap();
        let program = write_stub(dir.path(), "sleep 30");

        let cli = DockerCli::with_program(program);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let outcome = cli.inherit(&["logs", "-f", "abc"], &cancel).await.unwrap();
        assert_eq!(outcome, ExitOutcome::Cancelled);
    }
}
