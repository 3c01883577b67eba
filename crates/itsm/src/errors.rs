//! Actionable error formatting for improved user experience.
//!
//! This module provides utilities for creating error messages with:
//! - Clear error description
//! - Possible causes (diagnostics)
//! - Remediation steps (actionable fixes)
//!
//! Designed to help users understand what went wrong and how to fix it.

use std::fmt;
use std::path::Path;

/// An error with diagnostic context and remediation steps.
///
/// This struct wraps an error message with additional context to help users
/// diagnose and fix the problem. The formatted message carries no `Error:`
/// prefix of its own; the caller adds one when printing.
///
/// # Example
///
/// ```
/// use itsm::errors::ActionableError;
///
/// let error = ActionableError::new("Tracker storage is incomplete")
///     .with_cause("A storage subdirectory was deleted")
///     .with_remedy("Run 'itsm init' to recreate the layout");
///
/// eprintln!("Error: {}", error);
/// ```
#[derive(Debug, Clone)]
pub struct ActionableError {
    /// The main error message
    error: String,
    /// Possible causes (diagnostic hints)
    causes: Vec<String>,
    /// Remediation steps (how to fix)
    remediation: Vec<String>,
}

impl ActionableError {
    /// Create a new actionable error with the given message.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            causes: Vec::new(),
            remediation: Vec::new(),
        }
    }

    /// Add a possible cause (diagnostic hint).
    ///
    /// This helps users understand why the error might have occurred.
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Add a remediation step (actionable fix).
    ///
    /// This tells users what they can do to fix the problem.
    pub fn with_remedy(mut self, remedy: impl Into<String>) -> Self {
        self.remediation.push(remedy.into());
        self
    }

    /// Convert to a formatted error message suitable for display.
    pub fn to_error_message(&self) -> String {
        let mut msg = format!("{}\n", self.error);

        if !self.causes.is_empty() {
            msg.push_str("\nPossible causes:\n");
            for cause in &self.causes {
                msg.push_str(&format!("  • {}\n", cause));
            }
        }

        if !self.remediation.is_empty() {
            msg.push_str("\nTo fix:\n");
            for remedy in &self.remediation {
                msg.push_str(&format!("  • {}\n", remedy));
            }
        }

        msg
    }
}

impl fmt::Display for ActionableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_error_message().trim_end())
    }
}

impl std::error::Error for ActionableError {}

/// Helper for commands that need an initialized data directory.
pub fn data_dir_not_initialized(data_dir: &Path) -> ActionableError {
    ActionableError::new(format!(
        "No tracker data directory at {}",
        data_dir.display()
    ))
    .with_cause("No tracker has been initialized in this directory")
    .with_cause("The ITSM_DATA_DIR environment variable may point somewhere unexpected")
    .with_remedy("Initialize a tracker here: itsm init")
    .with_remedy("Set ITSM_DATA_DIR to an existing tracker directory")
}

/// Helper for a data directory that exists but is missing pieces.
pub fn storage_layout_broken(missing: &Path) -> ActionableError {
    ActionableError::new(format!(
        "Tracker storage is incomplete: missing {}",
        missing.display()
    ))
    .with_cause("A storage subdirectory or index file was deleted")
    .with_cause("The data directory was partially copied")
    .with_remedy("Run 'itsm init' to recreate the layout (existing records are kept)")
    .with_remedy("Restore the data directory from a backup")
}
