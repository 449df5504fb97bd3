//! Coordinated multi-task deletion
//!
//! Validation and lookup errors are collected per ID so sibling IDs keep
//! processing; cancellation and an empty delete set short-circuit with no
//! side effects. `git worktree prune` runs exactly once per batch, after
//! all removals.

use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use rover_core::prompt::Confirmation;
use rover_core::task::{parse_task_id, TaskStore};
use rover_core::telemetry::{TelemetryEvent, TelemetrySink};
use rover_core::Error;

use rover_worktree::{branch_for_task, WorkspaceManager};

use crate::error::{Result, RunnerError};

/// Options for a deletion batch
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Skip the confirmation prompt
    pub yes: bool,
    /// Machine-readable output mode; implies no prompt
    pub json: bool,
}

/// Aggregate result of a deletion batch
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub errors: Vec<String>,
    pub deleted_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Orchestrates deletion of one or more tasks
pub struct DeletionCoordinator {
    store: TaskStore,
    workspaces: WorkspaceManager,
    confirmation: Arc<dyn Confirmation>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl DeletionCoordinator {
    pub fn new(
        store: TaskStore,
        workspaces: WorkspaceManager,
        confirmation: Arc<dyn Confirmation>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            store,
            workspaces,
            confirmation,
            telemetry,
        }
    }

    /// Delete the tasks named by `ids`.
    ///
    /// The telemetry sink is flushed on every path out of this method,
    /// including cancellation and validation failure.
    pub async fn delete_tasks(&self, ids: &[String], options: &DeleteOptions) -> Result<DeleteOutcome> {
        let outcome = self.delete_tasks_inner(ids, options).await;
        self.telemetry.flush().await;
        outcome
    }

    async fn delete_tasks_inner(
        &self,
        ids: &[String],
        options: &DeleteOptions,
    ) -> Result<DeleteOutcome> {
        let mut errors = Vec::new();
        let mut targets: Vec<u64> = Vec::new();

        for raw in ids {
            let id = match parse_task_id(raw) {
                Ok(id) => id,
                Err(e) => {
                    errors.push(e.to_string());
                    continue;
                }
            };
            if targets.contains(&id) {
                continue;
            }
            if self.store.exists(id).await {
                targets.push(id);
            } else {
                errors.push(Error::TaskNotFound(id).to_string());
            }
        }

        if targets.is_empty() {
            self.telemetry
                .record(TelemetryEvent::DeletionFailed {
                    reason: "no deletable tasks".to_string(),
                })
                .await;
            return Ok(DeleteOutcome {
                success: false,
                errors,
                deleted_ids: Vec::new(),
                message: None,
            });
        }

        if !(options.yes || options.json) {
            let id_list = targets
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let prompt = format!(
                "Delete {} task(s) (IDs: {})? This removes their workspaces and branches.",
                targets.len(),
                id_list
            );
            let confirmed = self.confirmation.confirm(&prompt).await.unwrap_or(false);
            if !confirmed {
                self.telemetry
                    .record(TelemetryEvent::DeletionFailed {
                        reason: "cancelled".to_string(),
                    })
                    .await;
                return Ok(DeleteOutcome {
                    success: false,
                    errors: vec![RunnerError::Cancelled.to_string()],
                    deleted_ids: Vec::new(),
                    message: None,
                });
            }
        }

        let mut deleted_ids = Vec::new();
        let mut branches = Vec::new();
        for &id in &targets {
            // The record may be unreadable even though the directory
            // exists; fall back to the conventional paths in that case.
            let task = self.store.load_by_id(id).await.ok();
            let workspace = task.as_ref().and_then(|t| t.workspace.clone());
            let workspace_path = workspace
                .as_ref()
                .map(|w| w.path.clone())
                .unwrap_or_else(|| self.store.workspace_dir(id));
            let branch = workspace
                .map(|w| w.branch)
                .unwrap_or_else(|| branch_for_task(id));

            if let Err(e) = self.workspaces.remove_worktree(&workspace_path).await {
                warn!("Failed to remove worktree for task {}: {}", id, e);
            }

            match self.store.remove(id).await {
                Ok(_) => {
                    branches.push(branch);
                    deleted_ids.push(id);
                }
                Err(e) => errors.push(format!("Failed to delete task {}: {}", id, e)),
            }
        }

        // One prune for the whole batch; the tasks are already gone, so a
        // prune failure only delays registry reconciliation.
        if let Err(e) = self.workspaces.prune_worktrees().await {
            warn!("Failed to prune worktrees: {}", e);
        }

        // Branches stay registered to their worktrees until the prune
        // above, so they can only be deleted afterwards.
        for branch in &branches {
            self.workspaces.remove_branch(branch).await;
        }

        let success = !deleted_ids.is_empty();
        if success {
            self.telemetry
                .record(TelemetryEvent::TasksDeleted {
                    count: deleted_ids.len(),
                })
                .await;
        } else {
            self.telemetry
                .record(TelemetryEvent::DeletionFailed {
                    reason: "no tasks deleted".to_string(),
                })
                .await;
        }

        let message = success.then(|| {
            let id_list = deleted_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            format!("All tasks (IDs: {}) deleted successfully", id_list)
        });

        Ok(DeleteOutcome {
            success,
            errors,
            deleted_ids,
            message,
        })
    }
}
