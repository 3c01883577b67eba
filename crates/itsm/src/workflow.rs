//! Workflow tables for issues and change requests.
//!
//! Each workflow is a small static state machine: a set of status tokens, an
//! initial state, and the set of legal next states per status. Transition
//! legality is a pure table lookup. A no-op transition (current equals
//! proposed) is always legal and is decided before any token parsing, so a
//! record stuck in a state the tables no longer know can still be saved
//! without touching its status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{EntityKind, WorkflowDrift};

/// Issue lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    /// Just reported, nobody is working on it
    New,
    /// Being worked on
    InProgress,
    /// Work finished, awaiting confirmation
    Resolved,
    /// Confirmed done, terminal
    Closed,
}

impl IssueStatus {
    /// Every issue status, in lifecycle order
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::New,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Closed,
    ];

    /// The status token as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::New => "new",
            IssueStatus::InProgress => "in-progress",
            IssueStatus::Resolved => "resolved",
            IssueStatus::Closed => "closed",
        }
    }

    /// States legally reachable from this one in a single transition
    ///
    /// Resolved can move back to in-progress, which is how reopening works.
    pub fn allowed_next(&self) -> &'static [IssueStatus] {
        match self {
            IssueStatus::New => &[IssueStatus::InProgress],
            IssueStatus::InProgress => &[IssueStatus::Resolved],
            IssueStatus::Resolved => &[IssueStatus::InProgress, IssueStatus::Closed],
            IssueStatus::Closed => &[],
        }
    }

    /// True when no transitions leave this state
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = WorkflowDrift;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(IssueStatus::New),
            "in-progress" => Ok(IssueStatus::InProgress),
            "resolved" => Ok(IssueStatus::Resolved),
            "closed" => Ok(IssueStatus::Closed),
            _ => Err(WorkflowDrift::UnknownState {
                kind: EntityKind::Issue,
                status: s.to_string(),
            }),
        }
    }
}

/// Change request lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeStatus {
    /// Being drafted and assessed
    Planning,
    /// Approved for implementation
    Approved,
    /// Implementation underway
    Implementing,
    /// Implemented, terminal
    Completed,
    /// Abandoned, terminal
    Cancelled,
}

impl ChangeStatus {
    /// Every change status, in lifecycle order
    pub const ALL: [ChangeStatus; 5] = [
        ChangeStatus::Planning,
        ChangeStatus::Approved,
        ChangeStatus::Implementing,
        ChangeStatus::Completed,
        ChangeStatus::Cancelled,
    ];

    /// The status token as stored and displayed
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeStatus::Planning => "planning",
            ChangeStatus::Approved => "approved",
            ChangeStatus::Implementing => "implementing",
            ChangeStatus::Completed => "completed",
            ChangeStatus::Cancelled => "cancelled",
        }
    }

    /// States legally reachable from this one in a single transition
    ///
    /// Cancellation is available from every non-terminal state.
    pub fn allowed_next(&self) -> &'static [ChangeStatus] {
        match self {
            ChangeStatus::Planning => &[ChangeStatus::Approved, ChangeStatus::Cancelled],
            ChangeStatus::Approved => &[ChangeStatus::Implementing, ChangeStatus::Cancelled],
            ChangeStatus::Implementing => &[ChangeStatus::Completed, ChangeStatus::Cancelled],
            ChangeStatus::Completed => &[],
            ChangeStatus::Cancelled => &[],
        }
    }

    /// True when no transitions leave this state
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeStatus {
    type Err = WorkflowDrift;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(ChangeStatus::Planning),
            "approved" => Ok(ChangeStatus::Approved),
            "implementing" => Ok(ChangeStatus::Implementing),
            "completed" => Ok(ChangeStatus::Completed),
            "cancelled" => Ok(ChangeStatus::Cancelled),
            _ => Err(WorkflowDrift::UnknownState {
                kind: EntityKind::Change,
                status: s.to_string(),
            }),
        }
    }
}

/// True when the kind carries a workflow table
pub fn has_workflow(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::Issue | EntityKind::Change)
}

/// The status a freshly created record of this kind starts in
pub fn initial_status(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::Issue => Some(IssueStatus::New.as_str()),
        EntityKind::Change => Some(ChangeStatus::Planning.as_str()),
        _ => None,
    }
}

/// Decide whether a status transition is legal for this kind
///
/// Returns `Ok(false)` when the proposed token is unknown or the table has
/// no edge from current to proposed; the caller turns that into a rejection.
/// Returns [`WorkflowDrift`] when the current token itself is unknown, which
/// means stored state and workflow tables have diverged, or when the kind
/// has no workflow table at all.
pub fn is_transition_legal(
    kind: EntityKind,
    current: &str,
    proposed: &str,
) -> Result<bool, WorkflowDrift> {
    // No-op transitions are legal for any token, known or not
    if current == proposed {
        return Ok(true);
    }

    match kind {
        EntityKind::Issue => {
            let from: IssueStatus = current.parse()?;
            match proposed.parse::<IssueStatus>() {
                Ok(to) => Ok(from.allowed_next().contains(&to)),
                Err(_) => Ok(false),
            }
        }
        EntityKind::Change => {
            let from: ChangeStatus = current.parse()?;
            match proposed.parse::<ChangeStatus>() {
                Ok(to) => Ok(from.allowed_next().contains(&to)),
                Err(_) => Ok(false),
            }
        }
        kind => Err(WorkflowDrift::MissingTable { kind }),
    }
}
