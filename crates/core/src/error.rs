//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid task ID '{0}' - must be a number")]
    InvalidId(String),

    #[error("Task with ID {0} was not found")]
    TaskNotFound(u64),

    #[error("Task with ID {0} already exists")]
    DuplicateId(u64),

    #[error("No iterations found for task {0}")]
    NoIterations(u64),

    #[error("Invalid iteration '{0}' - must be a number")]
    InvalidIteration(String),

    #[error("Iteration {requested} not found for task {task_id}. Available iterations: {available}")]
    IterationNotFound {
        task_id: u64,
        requested: u32,
        available: String,
    },

    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("Confirmation prompt interrupted")]
    PromptInterrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
