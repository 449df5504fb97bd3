//! Iteration bookkeeping
//!
//! Iterations live as numbered subdirectories of a task directory:
//! `.rover/tasks/<id>/iterations/<n>/{context.md, plan.md}`.

use std::path::{Path, PathBuf};
use tracing::debug;

use super::model::Iteration;
use crate::{Error, Result};

/// Reads and writes iteration artifacts for tasks
#[derive(Debug, Clone)]
pub struct IterationStore {
    tasks_dir: PathBuf,
}

impl IterationStore {
    pub fn new(tasks_dir: impl Into<PathBuf>) -> Self {
        Self {
            tasks_dir: tasks_dir.into(),
        }
    }

    fn iterations_dir(&self, task_id: u64) -> PathBuf {
        self.tasks_dir.join(task_id.to_string()).join("iterations")
    }

    /// Directory of one iteration
    pub fn iteration_dir(&self, task_id: u64, number: u32) -> PathBuf {
        self.iterations_dir(task_id).join(number.to_string())
    }

    /// List iteration numbers for a task, ascending.
    ///
    /// Subdirectory names that do not parse as integers are ignored.
    pub async fn list_iterations(&self, task_id: u64) -> Result<Vec<u32>> {
        let dir = self.iterations_dir(task_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut numbers = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(n) = entry.file_name().to_str().and_then(|n| n.parse::<u32>().ok()) {
                numbers.push(n);
            }
        }

        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Resolve a requested iteration to a concrete number.
    ///
    /// With no request, the latest (highest-numbered) iteration wins. An
    /// explicit request must parse as an integer and be present on disk;
    /// the not-found message enumerates what is available.
    pub async fn resolve_iteration(&self, task_id: u64, requested: Option<&str>) -> Result<u32> {
        let available = self.list_iterations(task_id).await?;
        if available.is_empty() {
            return Err(Error::NoIterations(task_id));
        }

        match requested {
            None => Ok(*available.last().expect("non-empty")),
            Some(raw) => {
                let number = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| Error::InvalidIteration(raw.to_string()))?;
                if available.contains(&number) {
                    Ok(number)
                } else {
                    let listing = available
                        .iter()
                        .map(|n| n.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    Err(Error::IterationNotFound {
                        task_id,
                        requested: number,
                        available: listing,
                    })
                }
            }
        }
    }

    /// Record a new iteration: allocates the next number and writes the
    /// `context.md` and `plan.md` artifacts. The returned entry is ready
    /// for `TaskStore::update_iteration`.
    pub async fn record_iteration(
        &self,
        task_id: u64,
        context: &str,
        plan: &str,
    ) -> Result<Iteration> {
        let existing = self.list_iterations(task_id).await?;
        let number = existing.last().copied().unwrap_or(0) + 1;

        let dir = self.iteration_dir(task_id, number);
        tokio::fs::create_dir_all(&dir).await?;

        let context_path = dir.join("context.md");
        let plan_path = dir.join("plan.md");
        tokio::fs::write(&context_path, context).await?;
        tokio::fs::write(&plan_path, plan).await?;

        debug!("Recorded iteration {} for task {}", number, task_id);

        Ok(Iteration {
            number,
            timestamp: chrono::Utc::now().to_rfc3339(),
            context_path,
            plan_path,
        })
    }

    /// Path to an iteration artifact, e.g. `context.md`
    pub fn artifact_path(&self, task_id: u64, number: u32, name: &str) -> PathBuf {
        self.iteration_dir(task_id, number).join(name)
    }

    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }
}
