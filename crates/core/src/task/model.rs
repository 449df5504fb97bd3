//! Task model definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle status of a task
///
/// The orchestration core only reads and persists the status; the
/// workflow engine drives the transitions between these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Iterating,
    Completed,
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// The isolated git worktree attached to a task
///
/// Set once when the worktree is created. The path must correspond to an
/// existing worktree until task deletion removes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Absolute path to the worktree directory
    pub path: PathBuf,
    /// Branch checked out in the worktree
    pub branch: String,
}

/// Container created for a task's most recent run
///
/// Absent means no container has ever run for this task, which is
/// distinct from a container that has exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub status: String,
}

/// One execution pass of an agent workflow against the task workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iteration {
    /// Monotonic iteration number; numbering may be non-contiguous
    pub number: u32,
    /// ISO-8601 timestamp of when the iteration was recorded
    pub timestamp: String,
    pub context_path: PathBuf,
    pub plan_path: PathBuf,
}

/// A named workflow input, ordered as provided at task creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub value: String,
}

/// A task record, persisted as `description.json` in the task directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<TaskInput>,
    pub workflow_name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Workspace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerInfo>,
    #[serde(default)]
    pub iterations: Vec<Iteration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task with the given id and title
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: String::new(),
            inputs: Vec::new(),
            workflow_name: "swe".to_string(),
            status: TaskStatus::default(),
            workspace: None,
            container: None,
            iterations: Vec::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the workflow name
    pub fn with_workflow(mut self, workflow_name: impl Into<String>) -> Self {
        self.workflow_name = workflow_name.into();
        self
    }

    /// Append a workflow input, preserving insertion order
    pub fn with_input(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inputs.push(TaskInput {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_task() {
        let task = Task::new(1, "Fix the login bug");
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Fix the login bug");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.workspace.is_none());
        assert!(task.container.is_none());
        assert!(task.iterations.is_empty());
    }

    #[test]
    fn test_task_builder() {
        let task = Task::new(2, "Write docs")
            .with_description("Document the public API")
            .with_workflow("tech-writer")
            .with_input("audience", "end users")
            .with_input("format", "markdown");

        assert_eq!(task.description, "Document the public API");
        assert_eq!(task.workflow_name, "tech-writer");
        assert_eq!(task.inputs.len(), 2);
        assert_eq!(task.inputs[0].name, "audience");
        assert_eq!(task.inputs[1].name, "format");
    }

    #[test]
    fn test_task_serde_round_trip() {
        let mut task = Task::new(3, "Round trip").with_input("a", "b");
        task.workspace = Some(Workspace {
            path: PathBuf::from("/tmp/project/.rover/tasks/3/workspace"),
            branch: "rover-task-3".to_string(),
        });
        task.container = Some(ContainerInfo {
            id: "abc123".to_string(),
            status: "running".to_string(),
        });

        let json = serde_json::to_string_pretty(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, 3);
        assert_eq!(back.workspace, task.workspace);
        assert_eq!(back.container, task.container);
        assert_eq!(back.inputs, task.inputs);
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let task = Task::new(4, "Sparse");
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("workspace"));
        assert!(!json.contains("container"));
        assert!(!json.contains("failure_reason"));
    }
}
