//! Project root resolution
//!
//! The repository root is resolved once per context and cached on the
//! context itself. Components receive the context explicitly; there is no
//! hidden module-level cache, and `reset` clears the cached value for
//! test isolation.

use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::commands::{is_git_repository, repo_root};
use crate::error::{Result, WorktreeError};

/// Resolves and caches the project root for one invocation
#[derive(Debug)]
pub struct ProjectContext {
    start_dir: PathBuf,
    cached_root: RwLock<Option<PathBuf>>,
}

impl ProjectContext {
    /// Create a context that resolves the project root from `start_dir`
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            cached_root: RwLock::new(None),
        }
    }

    /// The repository root, resolved on first use and cached
    pub async fn root(&self) -> Result<PathBuf> {
        if let Some(root) = self.cached_root.read().await.clone() {
            return Ok(root);
        }

        if !is_git_repository(&self.start_dir).await? {
            return Err(WorktreeError::NotAGitRepository {
                path: self.start_dir.clone(),
            });
        }
        let root = repo_root(&self.start_dir).await?;
        debug!("Resolved project root: {:?}", root);

        *self.cached_root.write().await = Some(root.clone());
        Ok(root)
    }

    /// Drop the cached root so the next lookup resolves fresh
    pub async fn reset(&self) {
        *self.cached_root.write().await = None;
    }

    /// `<root>/.rover`
    pub async fn rover_dir(&self) -> Result<PathBuf> {
        Ok(self.root().await?.join(".rover"))
    }

    /// `<root>/.rover/tasks`
    pub async fn tasks_dir(&self) -> Result<PathBuf> {
        Ok(self.rover_dir().await?.join("tasks"))
    }

    /// The directory resolution starts from
    pub fn start_dir(&self) -> &Path {
        &self.start_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init_test_repo;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_root_resolution_and_cache() {
        let dir = init_test_repo().await;
        let context = ProjectContext::new(dir.path());

        let first = context.root().await.unwrap();
        let second = context.root().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[tokio::test]
    async fn test_root_outside_repository() {
        let dir = TempDir::new().unwrap();
        let context = ProjectContext::new(dir.path());

        assert!(matches!(
            context.root().await,
            Err(WorktreeError::NotAGitRepository { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_cache() {
        let dir = init_test_repo().await;
        let context = ProjectContext::new(dir.path());

        context.root().await.unwrap();
        context.reset().await;
        assert!(context.cached_root.read().await.is_none());

        // Resolves again after reset
        context.root().await.unwrap();
    }

    #[tokio::test]
    async fn test_tasks_dir_layout() {
        let dir = init_test_repo().await;
        let context = ProjectContext::new(dir.path());

        let tasks_dir = context.tasks_dir().await.unwrap();
        assert!(tasks_dir.ends_with(".rover/tasks"));
    }
}
