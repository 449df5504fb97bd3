//! Error types for the runner

use thiserror::Error;

/// Result type alias for runner operations
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Errors that can occur while driving containers or tearing down tasks
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Docker was reachable but the command failed for a reason other
    /// than a missing container
    #[error("Docker command failed: {0}")]
    Docker(String),

    /// Hard failure while retrieving logs
    #[error("Error retrieving container logs: {0}")]
    ContainerLogs(String),

    /// The container never existed or was removed. Recoverable: callers
    /// surface this as a warning, not a failure.
    #[error("No logs available for this container (id: {container_id})")]
    MissingContainer { container_id: String },

    /// The user declined or interrupted the deletion confirmation
    #[error("Task deletion cancelled")]
    Cancelled,

    #[error(transparent)]
    Worktree(#[from] rover_worktree::WorktreeError),

    #[error(transparent)]
    Core(#[from] rover_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RunnerError {
    /// Whether this error is a recoverable warning condition rather
    /// than a hard failure
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MissingContainer { .. })
    }
}
