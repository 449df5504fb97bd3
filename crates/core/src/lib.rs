//! Core library for Rover task orchestration
//!
//! This crate contains the task lifecycle state, including:
//! - Task records and their on-disk store
//! - Iteration bookkeeping
//! - Project configuration (`rover.json`)
//! - The agent registry and collaborator traits

pub mod agent;
pub mod config;
pub mod error;
pub mod prompt;
pub mod task;
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
