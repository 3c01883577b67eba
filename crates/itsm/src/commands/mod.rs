//! Command execution logic for all adapter operations.
//!
//! The `CommandExecutor` holds the business logic behind the CLI, the REST
//! API, and the mail gateway. Every mutation funnels through the validation
//! engine before anything is persisted, so the adapters cannot drift apart
//! in what they accept or in how they word a refusal.
//!
//! This module is organized into submodules by functional area:
//! - `issue`: Issue CRUD operations
//! - `change`: Change request CRUD operations
//! - `config_item`: Configuration item CRUD operations
//! - `relationship`: Relationship graph operations
//! - `validate`: Dry-run validation
//! - `mail`: Inbound mail ingestion

mod change;
mod config_item;
mod issue;
mod mail;
mod relationship;
mod validate;

pub use mail::MailOutcome;

// Common imports used across submodules
use crate::domain::{
    ChangeRequest, ConfigItem, EntityKind, Event, FieldMap, Issue, ProposedChange, Relationship,
    Verdict,
};
use crate::engine::{self, ValidationContext};
use crate::schema;
use crate::storage::EntityStore;
use anyhow::{anyhow, Result};
use chrono::Utc;

/// Parse an entity kind token from CLI or API input
///
/// Accepts the short aliases adapters use alongside the canonical tokens.
pub fn parse_kind(token: &str) -> Result<EntityKind> {
    match token {
        "issue" => Ok(EntityKind::Issue),
        "change" => Ok(EntityKind::Change),
        "ci" | "config-item" => Ok(EntityKind::ConfigItem),
        "rel" | "relationship" => Ok(EntityKind::Relationship),
        _ => Err(anyhow!(
            "Unknown entity kind: '{}'. Valid kinds: issue, change, ci, relationship",
            token
        )),
    }
}

/// Check delta field names and vocabulary tokens
///
/// These are input-shape errors, not verdicts: a typoed field name or an
/// out-of-vocabulary token is a malformed request, rejected before the
/// engine ever sees the proposal.
fn check_deltas(kind: EntityKind, deltas: &FieldMap) -> Result<()> {
    for (field, value) in deltas {
        schema::check_field(kind, field)?;
        schema::check_value(kind, field, value)?;
    }
    Ok(())
}

/// Turn a rejected verdict into a command error carrying the `Rejection`
fn require_accepted(verdict: Verdict) -> Result<()> {
    match verdict {
        Verdict::Accepted => Ok(()),
        Verdict::Rejected(rejection) => Err(anyhow::Error::new(rejection)),
    }
}

/// Executes adapter commands with business logic and validation.
///
/// Generic over the storage backend to support different implementations
/// (JSON files, in-memory, etc.).
pub struct CommandExecutor<S: EntityStore> {
    storage: S,
}

impl<S: EntityStore> CommandExecutor<S> {
    /// Create a new command executor with the given storage
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Get reference to the storage backend
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Initialize a new tracker data directory
    pub fn init(&self) -> Result<()> {
        self.storage.init()?;
        println!("Initialized itsm repository");
        Ok(())
    }

    /// Last `n` events in append order
    pub fn tail_events(&self, n: usize) -> Result<Vec<Event>> {
        let events = self.storage.read_events()?;
        let skip = events.len().saturating_sub(n);
        Ok(events.into_iter().skip(skip).collect())
    }
}
