//! File-based task storage
//!
//! Each task owns a directory under `.rover/tasks/<id>/`; the record
//! itself lives in `description.json` inside that directory.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::model::{ContainerInfo, Iteration, Task, TaskStatus, Workspace};
use crate::{Error, Result};

/// Parse a task ID with lenient integer semantics.
///
/// Parsing stops at the first non-digit, so `"1.5"` resolves to task `1`.
/// A string with no leading digits (including the empty string) is
/// rejected before any lookup happens.
pub fn parse_task_id(raw: &str) -> Result<u64> {
    let digits: &str = {
        let end = raw
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(raw.len());
        &raw[..end]
    };

    if digits.is_empty() {
        return Err(Error::InvalidId(raw.to_string()));
    }

    digits
        .parse::<u64>()
        .map_err(|_| Error::InvalidId(raw.to_string()))
}

#[derive(Serialize)]
struct WorkflowFile<'a> {
    name: &'a str,
}

/// Task store rooted at a `.rover/tasks` directory
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks_dir: PathBuf,
}

impl TaskStore {
    /// Create a store rooted at the given tasks directory
    /// (conventionally `<project root>/.rover/tasks`).
    pub fn new(tasks_dir: impl Into<PathBuf>) -> Self {
        Self {
            tasks_dir: tasks_dir.into(),
        }
    }

    /// The tasks directory this store reads and writes
    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }

    /// Directory owned by a task
    pub fn task_dir(&self, id: u64) -> PathBuf {
        self.tasks_dir.join(id.to_string())
    }

    /// Path of a task's workspace worktree
    pub fn workspace_dir(&self, id: u64) -> PathBuf {
        self.task_dir(id).join("workspace")
    }

    fn description_path(&self, id: u64) -> PathBuf {
        self.task_dir(id).join("description.json")
    }

    /// Create a new task record; fails if the id is already taken.
    ///
    /// Also writes the task's `workflow.yml` so the workflow engine can
    /// pick it up without consulting the record.
    pub async fn create(&self, task: Task) -> Result<Task> {
        if self.exists(task.id).await {
            return Err(Error::DuplicateId(task.id));
        }

        self.persist(&task).await?;

        let workflow = serde_yaml::to_string(&WorkflowFile {
            name: &task.workflow_name,
        })?;
        tokio::fs::write(self.task_dir(task.id).join("workflow.yml"), workflow).await?;

        debug!("Created task {} ({})", task.id, task.title);
        Ok(task)
    }

    /// Whether a record exists for the given id
    pub async fn exists(&self, id: u64) -> bool {
        self.description_path(id).exists()
    }

    /// Load a task from a raw (possibly messy) id string.
    ///
    /// Applies the lenient parse of [`parse_task_id`] first, so `"1.5"`
    /// loads task `1` while `"invalid"` fails fast.
    pub async fn load(&self, raw_id: &str) -> Result<Task> {
        let id = parse_task_id(raw_id)?;
        self.load_by_id(id).await
    }

    /// Load a task by its exact id
    pub async fn load_by_id(&self, id: u64) -> Result<Task> {
        let path = self.description_path(id);
        if !path.exists() {
            return Err(Error::TaskNotFound(id));
        }
        let content = tokio::fs::read_to_string(&path).await?;
        let task: Task = serde_json::from_str(&content)?;
        Ok(task)
    }

    /// List all task records, ascending by id.
    ///
    /// Directories without a readable `description.json` are skipped with
    /// a warning rather than failing the listing.
    pub async fn list(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        if !self.tasks_dir.exists() {
            return Ok(tasks);
        }

        let mut entries = tokio::fs::read_dir(&self.tasks_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(id) = name.to_str().and_then(|n| n.parse::<u64>().ok()) else {
                continue;
            };
            match self.load_by_id(id).await {
                Ok(task) => tasks.push(task),
                Err(e) => warn!("Skipping unreadable task {}: {}", id, e),
            }
        }

        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    /// Next free task id (max existing + 1, starting at 1)
    pub async fn next_id(&self) -> Result<u64> {
        let mut max = 0u64;
        if self.tasks_dir.exists() {
            let mut entries = tokio::fs::read_dir(&self.tasks_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if let Some(id) = entry.file_name().to_str().and_then(|n| n.parse::<u64>().ok()) {
                    max = max.max(id);
                }
            }
        }
        Ok(max + 1)
    }

    /// Attach a workspace to a task
    pub async fn set_workspace(
        &self,
        id: u64,
        path: impl Into<PathBuf>,
        branch: impl Into<String>,
    ) -> Result<Task> {
        let mut task = self.load_by_id(id).await?;
        task.workspace = Some(Workspace {
            path: path.into(),
            branch: branch.into(),
        });
        self.persist(&task).await?;
        Ok(task)
    }

    /// Record the container created for a task
    pub async fn set_container_info(
        &self,
        id: u64,
        container_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Result<Task> {
        let mut task = self.load_by_id(id).await?;
        task.container = Some(ContainerInfo {
            id: container_id.into(),
            status: status.into(),
        });
        self.persist(&task).await?;
        Ok(task)
    }

    pub async fn mark_in_progress(&self, id: u64) -> Result<Task> {
        self.set_status(id, TaskStatus::InProgress).await
    }

    pub async fn mark_iterating(&self, id: u64) -> Result<Task> {
        self.set_status(id, TaskStatus::Iterating).await
    }

    pub async fn mark_completed(&self, id: u64) -> Result<Task> {
        self.set_status(id, TaskStatus::Completed).await
    }

    /// Mark a task failed, recording the reason
    pub async fn mark_failed(&self, id: u64, reason: impl Into<String>) -> Result<Task> {
        let mut task = self.load_by_id(id).await?;
        task.status = TaskStatus::Failed;
        task.failure_reason = Some(reason.into());
        self.persist(&task).await?;
        Ok(task)
    }

    /// Append or replace an iteration entry.
    ///
    /// Re-applying an entry with the same number overwrites it in place,
    /// keeping the method idempotent.
    pub async fn update_iteration(&self, id: u64, iteration: Iteration) -> Result<Task> {
        let mut task = self.load_by_id(id).await?;
        match task
            .iterations
            .iter_mut()
            .find(|it| it.number == iteration.number)
        {
            Some(existing) => *existing = iteration,
            None => task.iterations.push(iteration),
        }
        task.iterations.sort_by_key(|it| it.number);
        self.persist(&task).await?;
        Ok(task)
    }

    /// Remove a task's entire directory tree.
    ///
    /// Returns whether anything was removed; a missing directory is not
    /// an error, so repeated removal is idempotent.
    pub async fn remove(&self, id: u64) -> Result<bool> {
        let dir = self.task_dir(id);
        if !dir.exists() {
            return Ok(false);
        }
        tokio::fs::remove_dir_all(&dir).await?;
        debug!("Removed task directory {:?}", dir);
        Ok(true)
    }

    async fn set_status(&self, id: u64, status: TaskStatus) -> Result<Task> {
        let mut task = self.load_by_id(id).await?;
        task.status = status;
        self.persist(&task).await?;
        Ok(task)
    }

    async fn persist(&self, task: &Task) -> Result<()> {
        let mut task = task.clone();
        task.updated_at = chrono::Utc::now();

        let dir = self.task_dir(task.id);
        tokio::fs::create_dir_all(&dir).await?;

        let content = serde_json::to_string_pretty(&task)?;
        tokio::fs::write(self.description_path(task.id), content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TaskStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = TaskStore::new(temp.path().join(".rover").join("tasks"));
        (store, temp)
    }

    #[test]
    fn test_parse_task_id_lenient() {
        assert_eq!(parse_task_id("1").unwrap(), 1);
        assert_eq!(parse_task_id("42").unwrap(), 42);
        assert_eq!(parse_task_id("1.5").unwrap(), 1);
        assert_eq!(parse_task_id("7abc").unwrap(), 7);
    }

    #[test]
    fn test_parse_task_id_rejects_non_numeric() {
        assert!(matches!(parse_task_id("invalid"), Err(Error::InvalidId(_))));
        assert!(matches!(parse_task_id(""), Err(Error::InvalidId(_))));
        assert!(matches!(parse_task_id("-3"), Err(Error::InvalidId(_))));
        assert!(matches!(parse_task_id(".5"), Err(Error::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let (store, _temp) = test_store();

        let task = Task::new(1, "First task").with_description("details");
        store.create(task).await.unwrap();

        let loaded = store.load_by_id(1).await.unwrap();
        assert_eq!(loaded.title, "First task");
        assert_eq!(loaded.description, "details");
        assert_eq!(loaded.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_writes_workflow_file() {
        let (store, _temp) = test_store();

        store
            .create(Task::new(1, "T").with_workflow("tech-writer"))
            .await
            .unwrap();

        let workflow = tokio::fs::read_to_string(store.task_dir(1).join("workflow.yml"))
            .await
            .unwrap();
        assert!(workflow.contains("name: tech-writer"));
    }

    #[tokio::test]
    async fn test_create_duplicate_id() {
        let (store, _temp) = test_store();

        store.create(Task::new(1, "One")).await.unwrap();
        let result = store.create(Task::new(1, "Again")).await;
        assert!(matches!(result, Err(Error::DuplicateId(1))));
    }

    #[tokio::test]
    async fn test_load_lenient_id() {
        let (store, _temp) = test_store();
        store.create(Task::new(1, "One")).await.unwrap();

        let loaded = store.load("1.5").await.unwrap();
        assert_eq!(loaded.id, 1);

        assert!(matches!(
            store.load("invalid").await,
            Err(Error::InvalidId(_))
        ));
        assert!(matches!(store.load("").await, Err(Error::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_load_missing_task() {
        let (store, _temp) = test_store();
        assert!(matches!(
            store.load_by_id(99).await,
            Err(Error::TaskNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_list_sorted_by_id() {
        let (store, _temp) = test_store();
        store.create(Task::new(3, "Three")).await.unwrap();
        store.create(Task::new(1, "One")).await.unwrap();
        store.create(Task::new(2, "Two")).await.unwrap();

        let tasks = store.list().await.unwrap();
        let ids: Vec<u64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_next_id() {
        let (store, _temp) = test_store();
        assert_eq!(store.next_id().await.unwrap(), 1);

        store.create(Task::new(1, "One")).await.unwrap();
        store.create(Task::new(5, "Five")).await.unwrap();
        assert_eq!(store.next_id().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_set_workspace_and_container() {
        let (store, _temp) = test_store();
        store.create(Task::new(1, "One")).await.unwrap();

        store
            .set_workspace(1, "/tmp/p/.rover/tasks/1/workspace", "rover-task-1")
            .await
            .unwrap();
        let task = store
            .set_container_info(1, "deadbeef", "running")
            .await
            .unwrap();

        let ws = task.workspace.unwrap();
        assert_eq!(ws.branch, "rover-task-1");
        let container = task.container.unwrap();
        assert_eq!(container.id, "deadbeef");
        assert_eq!(container.status, "running");
    }

    #[tokio::test]
    async fn test_status_transitions_idempotent() {
        let (store, _temp) = test_store();
        store.create(Task::new(1, "One")).await.unwrap();

        store.mark_in_progress(1).await.unwrap();
        let again = store.mark_in_progress(1).await.unwrap();
        assert_eq!(again.status, TaskStatus::InProgress);

        let failed = store.mark_failed(1, "container crashed").await.unwrap();
        assert_eq!(failed.status, TaskStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("container crashed"));
    }

    #[tokio::test]
    async fn test_update_iteration_idempotent() {
        let (store, _temp) = test_store();
        store.create(Task::new(1, "One")).await.unwrap();

        let entry = Iteration {
            number: 1,
            timestamp: "2026-08-07T00:00:00Z".to_string(),
            context_path: PathBuf::from("iterations/1/context.md"),
            plan_path: PathBuf::from("iterations/1/plan.md"),
        };
        store.update_iteration(1, entry.clone()).await.unwrap();
        let task = store.update_iteration(1, entry).await.unwrap();
        assert_eq!(task.iterations.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_idempotent() {
        let (store, _temp) = test_store();
        store.create(Task::new(1, "One")).await.unwrap();

        assert!(store.remove(1).await.unwrap());
        assert!(!store.task_dir(1).exists());
        assert!(!store.remove(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_persistence_across_instances() {
        let temp = TempDir::new().unwrap();
        let tasks_dir = temp.path().join(".rover").join("tasks");

        {
            let store = TaskStore::new(&tasks_dir);
            store
                .create(Task::new(7, "Persistent").with_input("key", "value"))
                .await
                .unwrap();
            store.mark_completed(7).await.unwrap();
        }

        {
            let store = TaskStore::new(&tasks_dir);
            let task = store.load_by_id(7).await.unwrap();
            assert_eq!(task.title, "Persistent");
            assert_eq!(task.status, TaskStatus::Completed);
            assert_eq!(task.inputs[0].value, "value");
        }
    }
}
