//! Rover runner - container lifecycle and coordinated task deletion
//!
//! This crate drives the Docker side of a task (entrypoint generation,
//! container launch, log retrieval) and owns multi-task deletion with
//! partial-failure reporting.

mod container;
mod delete;
mod docker;
mod entrypoint;
mod error;

pub use container::ContainerOrchestrator;
pub use delete::{DeleteOptions, DeleteOutcome, DeletionCoordinator};
pub use docker::{DockerCli, DockerOutput, ExitOutcome};
pub use entrypoint::{mcp_setup_commands, render_entrypoint, EntrypointSpec};
pub use error::{Result, RunnerError};
