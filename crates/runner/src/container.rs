//! Container orchestration
//!
//! Drives the Docker side of a task: entrypoint and inputs generation,
//! container launch, and log retrieval in batch or follow mode.

use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rover_core::agent::AgentKind;
use rover_core::config::ProjectConfig;
use rover_core::task::{ContainerInfo, Task, TaskStore};
use rover_core::Error;

use crate::docker::{DockerCli, ExitOutcome};
use crate::entrypoint::{render_entrypoint, EntrypointSpec};
use crate::error::{Result, RunnerError};

#[derive(Serialize)]
struct InputsFile<'a> {
    title: &'a str,
    description: &'a str,
}

/// Orchestrates containers for tasks
pub struct ContainerOrchestrator {
    docker: DockerCli,
    store: TaskStore,
    config: ProjectConfig,
    // Daemon mode is probed at most once per orchestrator
    rootless: OnceCell<bool>,
}

impl ContainerOrchestrator {
    pub fn new(store: TaskStore, config: ProjectConfig) -> Self {
        Self::with_docker(store, config, DockerCli::new())
    }

    /// Use a specific docker CLI (tests point this at a stub binary)
    pub fn with_docker(store: TaskStore, config: ProjectConfig, docker: DockerCli) -> Self {
        Self {
            docker,
            store,
            config,
            rootless: OnceCell::new(),
        }
    }

    /// Whether the daemon runs rootless, probed once and cached.
    ///
    /// Detection failure is not fatal: the recovery snippet is an
    /// accommodation for one daemon mode, so an unreadable `docker info`
    /// downgrades to the non-rootless rendering with a warning.
    async fn is_rootless(&self) -> bool {
        *self
            .rootless
            .get_or_init(|| async {
                match self.docker.is_rootless().await {
                    Ok(rootless) => rootless,
                    Err(e) => {
                        warn!("Could not detect docker daemon mode: {}", e);
                        false
                    }
                }
            })
            .await
    }

    /// Render and write the task's `entrypoint.sh` (mode 0755)
    pub async fn generate_entrypoint(&self, task: &Task, agent: AgentKind) -> Result<PathBuf> {
        let spec = EntrypointSpec {
            agent,
            mcp_servers: &self.config.mcp_servers,
            rootless: self.is_rootless().await,
        };
        let script = render_entrypoint(&spec)?;

        let dir = self.store.task_dir(task.id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("entrypoint.sh");
        tokio::fs::write(&path, script).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).await?;
        }

        Ok(path)
    }

    /// Write the task's `inputs.json`, carrying only title and description
    pub async fn generate_inputs(&self, task: &Task) -> Result<PathBuf> {
        let inputs = InputsFile {
            title: &task.title,
            description: &task.description,
        };

        let dir = self.store.task_dir(task.id);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("inputs.json");
        tokio::fs::write(&path, serde_json::to_string_pretty(&inputs)?).await?;
        Ok(path)
    }

    /// Launch a detached container for the task and record it.
    ///
    /// Mounts the workspace at `/workspace`, the task directory at
    /// `/output`, plus whatever credential mounts the agent needs.
    pub async fn launch(&self, task: &Task, agent: AgentKind) -> Result<ContainerInfo> {
        let workspace = task.workspace.as_ref().ok_or_else(|| {
            RunnerError::Core(Error::InvalidInput(format!(
                "Task {} has no workspace to run in",
                task.id
            )))
        })?;

        let entrypoint = self.generate_entrypoint(task, agent).await?;
        self.generate_inputs(task).await?;

        let task_dir = self.store.task_dir(task.id);
        let name = format!("rover-task-{}", task.id);

        let mut args: Vec<String> = vec![
            "run".into(),
            "-d".into(),
            "--name".into(),
            name,
            "-v".into(),
            format!("{}:/workspace", workspace.path.display()),
            "-v".into(),
            format!("{}:/output", task_dir.display()),
            "-v".into(),
            format!("{}:/entrypoint.sh:ro", entrypoint.display()),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            for (host, container) in agent.container_mounts(std::path::Path::new(&home)) {
                args.push("-v".into());
                args.push(format!("{}:{}", host.display(), container.display()));
            }
        }
        args.push("--entrypoint".into());
        args.push("/entrypoint.sh".into());
        args.push(self.config.image.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.docker.run_checked(&arg_refs).await?;
        let container_id = stdout.trim().to_string();

        info!("Launched container {} for task {}", container_id, task.id);

        let task = self
            .store
            .set_container_info(task.id, &container_id, "running")
            .await?;
        Ok(task.container.expect("container info just set"))
    }

    /// Retrieve the full logs of a container.
    ///
    /// A missing container is a recoverable condition surfaced as
    /// [`RunnerError::MissingContainer`]; anything else is a hard
    /// failure carrying docker's own message.
    pub async fn get_logs(&self, container_id: &str) -> Result<String> {
        let output = self.docker.run(&["logs", container_id]).await?;

        if output.success {
            return Ok(output.stdout);
        }

        if output.stderr.contains("No such container") {
            warn!("No logs available for container {}", container_id);
            return Err(RunnerError::MissingContainer {
                container_id: container_id.to_string(),
            });
        }

        Err(RunnerError::ContainerLogs(output.stderr.trim().to_string()))
    }

    /// Stream logs to the terminal until the container exits or `cancel`
    /// fires. A non-zero exit is reported as a warning, not a failure.
    pub async fn follow_logs(
        &self,
        container_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ExitOutcome> {
        let outcome = self
            .docker
            .inherit(&["logs", "-f", container_id], cancel)
            .await?;

        match outcome {
            ExitOutcome::Completed(code) if code != 0 => {
                warn!("Log streaming for {} ended with exit code {}", container_id, code);
            }
            ExitOutcome::Cancelled => {
                info!("Log streaming for {} cancelled", container_id);
            }
            _ => {}
        }

        Ok(outcome)
    }
}
