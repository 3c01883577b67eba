//! ITSM Tracker Library
//!
//! This library provides the core functionality for the itsm change tracker:
//! entity records, workflow enforcement, CMDB dependency validation, and the
//! validation engine shared by every adapter (CLI, REST, mail).

pub mod audit;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod mailgate;
pub mod output;
pub mod schema;
pub mod storage;
pub mod workflow;

#[cfg(test)]
mod engine_proptests;

// Re-export commonly used types
pub use commands::{CommandExecutor, MailOutcome};
pub use domain::{
    EntityKind, FieldMap, FieldValue, ProposedChange, RejectReason, Rejection, Verdict,
    WorkflowDrift,
};
pub use engine::{validate, ValidationContext};
pub use graph::DependencyGraph;
pub use output::{ExitCode, JsonError, JsonOutput};
pub use storage::{EntityStore, InMemoryStorage, JsonFileStorage};
