//! Workspace management
//!
//! Every task workspace is a git worktree at
//! `.rover/tasks/<id>/workspace`, checked out to its own branch.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use rover_core::task::Workspace;

use crate::commands::{
    branch_exists, delete_branch, git_command_checked, head_exists, is_git_repository,
};
use crate::error::{Result, WorktreeError};

/// Default branch name for a task
pub fn branch_for_task(task_id: u64) -> String {
    format!("rover-task-{}", task_id)
}

/// One line of `git worktree list --porcelain`, parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    pub branch: String,
    pub head: String,
}

/// Creates and removes task worktrees for one repository
#[derive(Debug)]
pub struct WorkspaceManager {
    repo_root: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager rooted at the repository root
    pub async fn new(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let repo_root = repo_root.into();
        if !is_git_repository(&repo_root).await? {
            return Err(WorktreeError::NotAGitRepository { path: repo_root });
        }
        Ok(Self { repo_root })
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Path where a task's worktree lives
    pub fn workspace_path(&self, task_id: u64) -> PathBuf {
        self.repo_root
            .join(".rover")
            .join("tasks")
            .join(task_id.to_string())
            .join("workspace")
    }

    /// Create the worktree and branch for a task.
    ///
    /// Fails when the repository has no commits yet or when the branch
    /// already exists.
    pub async fn create_worktree(&self, task_id: u64, branch: &str) -> Result<Workspace> {
        if !head_exists(&self.repo_root).await? {
            return Err(WorktreeError::NoCommits {
                path: self.repo_root.clone(),
            });
        }

        if branch_exists(&self.repo_root, branch).await? {
            return Err(WorktreeError::BranchExists {
                branch: branch.to_string(),
            });
        }

        let worktree_path = self.workspace_path(task_id);
        if let Some(parent) = worktree_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(
            "Creating worktree for task {} at {:?} on branch {}",
            task_id, worktree_path, branch
        );

        git_command_checked(
            &self.repo_root,
            &[
                "worktree",
                "add",
                worktree_path.to_str().ok_or_else(|| {
                    WorktreeError::git_failed("Worktree path is not valid UTF-8")
                })?,
                "-b",
                branch,
            ],
        )
        .await?;

        Ok(Workspace {
            path: worktree_path,
            branch: branch.to_string(),
        })
    }

    /// Remove a worktree directory.
    ///
    /// Best-effort recursive removal; a missing path is treated as
    /// success so repeated removal is idempotent. Reconciling git's
    /// worktree registry is left to [`WorkspaceManager::prune_worktrees`].
    pub async fn remove_worktree(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!("Worktree path {:?} already gone", path);
            return Ok(());
        }
        tokio::fs::remove_dir_all(path).await?;
        info!("Removed worktree at {:?}", path);
        Ok(())
    }

    /// Delete a task branch, logging instead of failing when it is
    /// already gone.
    pub async fn remove_branch(&self, branch: &str) {
        if let Err(e) = delete_branch(&self.repo_root, branch, true).await {
            warn!("Failed to delete branch {}: {}", branch, e);
        }
    }

    /// Run `git worktree prune` once.
    ///
    /// Called a single time after a batch of removals, not once per task.
    pub async fn prune_worktrees(&self) -> Result<()> {
        git_command_checked(&self.repo_root, &["worktree", "prune"]).await?;
        Ok(())
    }

    /// List registered worktrees from `git worktree list --porcelain`
    pub async fn list_worktrees(&self) -> Result<Vec<WorktreeEntry>> {
        let output =
            git_command_checked(&self.repo_root, &["worktree", "list", "--porcelain"]).await?;

        let mut entries = Vec::new();
        let mut current: Option<WorktreeEntry> = None;

        for line in output.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                if let Some(entry) = current.take() {
                    entries.push(entry);
                }
                current = Some(WorktreeEntry {
                    path: PathBuf::from(path),
                    branch: String::new(),
                    head: String::new(),
                });
            } else if let Some(ref mut entry) = current {
                if let Some(head) = line.strip_prefix("HEAD ") {
                    entry.head = head.to_string();
                } else if let Some(branch) = line.strip_prefix("branch refs/heads/") {
                    entry.branch = branch.to_string();
                }
            }
        }
        if let Some(entry) = current {
            entries.push(entry);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{git_command_checked, init_test_repo};

    #[tokio::test]
    async fn test_branch_for_task() {
        assert_eq!(branch_for_task(7), "rover-task-7");
    }

    #[tokio::test]
    async fn test_create_worktree() {
        let dir = init_test_repo().await;
        let manager = WorkspaceManager::new(dir.path()).await.unwrap();

        let workspace = manager
            .create_worktree(1, &branch_for_task(1))
            .await
            .unwrap();

        assert!(workspace.path.exists());
        assert!(workspace.path.ends_with(".rover/tasks/1/workspace"));
        assert_eq!(workspace.branch, "rover-task-1");

        let listed = manager.list_worktrees().await.unwrap();
        assert!(listed.iter().any(|e| e.branch == "rover-task-1"));
    }

    #[tokio::test]
    async fn test_create_worktree_without_commits() {
        let dir = tempfile::TempDir::new().unwrap();
        git_command_checked(dir.path(), &["init"]).await.unwrap();
        let manager = WorkspaceManager::new(dir.path()).await.unwrap();

        let result = manager.create_worktree(1, "rover-task-1").await;
        assert!(matches!(result, Err(WorktreeError::NoCommits { .. })));
    }

    #[tokio::test]
    async fn test_create_worktree_branch_exists() {
        let dir = init_test_repo().await;
        let manager = WorkspaceManager::new(dir.path()).await.unwrap();

        manager.create_worktree(1, "rover-task-1").await.unwrap();
        let result = manager.create_worktree(2, "rover-task-1").await;
        assert!(matches!(result, Err(WorktreeError::BranchExists { .. })));
    }

    #[tokio::test]
    async fn test_not_a_repository() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = WorkspaceManager::new(dir.path()).await;
        assert!(matches!(
            result,
            Err(WorktreeError::NotAGitRepository { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_worktree_idempotent() {
        let dir = init_test_repo().await;
        let manager = WorkspaceManager::new(dir.path()).await.unwrap();

        let workspace = manager.create_worktree(1, "rover-task-1").await.unwrap();
        manager.remove_worktree(&workspace.path).await.unwrap();
        assert!(!workspace.path.exists());

        // Removing again is a no-op
        manager.remove_worktree(&workspace.path).await.unwrap();
    }

    #[tokio::test]
    async fn test_prune_after_manual_removal() {
        let dir = init_test_repo().await;
        let manager = WorkspaceManager::new(dir.path()).await.unwrap();

        let workspace = manager.create_worktree(1, "rover-task-1").await.unwrap();
        tokio::fs::remove_dir_all(&workspace.path).await.unwrap();

        manager.prune_worktrees().await.unwrap();

        let listed = manager.list_worktrees().await.unwrap();
        assert!(!listed.iter().any(|e| e.branch == "rover-task-1"));
    }

    #[tokio::test]
    async fn test_remove_branch_best_effort() {
        let dir = init_test_repo().await;
        let manager = WorkspaceManager::new(dir.path()).await.unwrap();

        // Deleting a branch that never existed only logs
        manager.remove_branch("rover-task-99").await;
    }
}
