//! Structured output formatting for CLI commands.
//!
//! This module provides consistent JSON output formatting for both success
//! and error cases, ensuring machine-readable output that works well with
//! scripts and automation tools.

use chrono::Utc;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt::Display;
use std::io::{self, Write};

use crate::domain::{
    ChangeRequest, ConfigItem, EntityKind, RejectReason, Rejection, Relationship, WorkflowDrift,
};

/// Version of the JSON output format
const OUTPUT_VERSION: &str = "0.2.0";

// ============================================================================
// Output Context for Quiet Mode
// ============================================================================

/// Context for controlling output verbosity
pub struct OutputContext {
    quiet: bool,
    json: bool,
}

impl OutputContext {
    /// Create a new output context
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Print essential output (always shown unless --json)
    pub fn print_data(&self, msg: impl Display) -> io::Result<()> {
        if !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print informational message (suppressed by --quiet or --json)
    pub fn print_info(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print success message (suppressed by --quiet or --json)
    pub fn print_success(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe(&format!("{}", msg))
        } else {
            Ok(())
        }
    }

    /// Print warning (suppressed by --quiet or --json)
    pub fn print_warning(&self, msg: impl Display) -> io::Result<()> {
        if !self.quiet && !self.json {
            writeln_safe_stderr(&format!("Warning: {}", msg))
        } else {
            Ok(())
        }
    }

    /// Print error (always shown to stderr)
    pub fn print_error(&self, msg: impl Display) -> io::Result<()> {
        writeln_safe_stderr(&format!("Error: {}", msg))
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Check if JSON mode is enabled
    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Safe println that handles broken pipes gracefully
fn writeln_safe(msg: &str) -> io::Result<()> {
    match writeln!(io::stdout(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Silently exit on broken pipe (expected when piping to head, etc.)
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

/// Safe eprintln that handles broken pipes gracefully
fn writeln_safe_stderr(msg: &str) -> io::Result<()> {
    match writeln!(io::stderr(), "{}", msg) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            // Silently exit on broken pipe
            std::process::exit(0);
        }
        Err(e) => Err(e),
    }
}

// ============================================================================
// JSON Output Types
// ============================================================================

/// Wrapper for successful command output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub metadata: Metadata,
}

impl<T: Serialize> JsonOutput<T> {
    /// Create a new successful output with the given data
    pub fn success(data: T, command: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            metadata: Metadata::new(command),
        }
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Wrapper for error output with suggestions
#[derive(Debug, Serialize)]
pub struct JsonError {
    pub success: bool,
    pub error: ErrorDetail,
    pub metadata: Metadata,
}

impl JsonError {
    /// Create a new error output
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
                suggestions: Vec::new(),
            },
            metadata: Metadata::new(command),
        }
    }

    /// Add details to the error
    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Add a suggestion to the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.error.suggestions.push(suggestion.into());
        self
    }

    /// Serialize to JSON string with pretty formatting
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ErrorCode::to_exit_code(&self.error.code)
    }
}

/// Error details including code, message, and suggestions
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Error code (e.g., "CIRCULAR_DEPENDENCY", "NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Suggested actions to resolve the error
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

// ============================================================================
// Exit Codes
// ============================================================================

/// Standardized exit codes for the ITSM CLI
///
/// These codes follow Unix conventions and provide consistent error reporting
/// for automation and scripting.
///
/// # Examples
///
/// ```rust
/// use itsm::ExitCode;
///
/// assert_eq!(ExitCode::Success.code(), 0);
/// assert_eq!(ExitCode::ValidationRejected.code(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded (0)
    Success = 0,

    /// Generic error (1)
    GenericError = 1,

    /// Invalid arguments or usage error (2)
    InvalidArgument = 2,

    /// Resource not found - issue, change, CI, relationship (3)
    NotFound = 3,

    /// Mutation rejected by validation - workflow, required fields, graph (4)
    ValidationRejected = 4,

    /// Stored data references a state outside the workflow tables (5)
    ConfigDrift = 5,
}

impl ExitCode {
    /// Convert exit code to i32 for `std::process::exit`
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get a description of what this exit code means
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Command succeeded",
            ExitCode::GenericError => "Generic error occurred",
            ExitCode::InvalidArgument => "Invalid arguments or usage error",
            ExitCode::NotFound => "Resource not found (issue, change, CI, relationship)",
            ExitCode::ValidationRejected => {
                "Mutation rejected by validation (workflow, required fields, graph)"
            }
            ExitCode::ConfigDrift => "Stored data references a state outside the workflow tables",
        }
    }

    /// Get all exit codes as a formatted string for documentation
    pub fn all_codes_documentation() -> String {
        format!(
            "Exit Codes:\n\
             {} - {}\n\
             {} - {}\n\
             {} - {}\n\
             {} - {}\n\
             {} - {}\n\
             {} - {}",
            ExitCode::Success.code(),
            ExitCode::Success.description(),
            ExitCode::GenericError.code(),
            ExitCode::GenericError.description(),
            ExitCode::InvalidArgument.code(),
            ExitCode::InvalidArgument.description(),
            ExitCode::NotFound.code(),
            ExitCode::NotFound.description(),
            ExitCode::ValidationRejected.code(),
            ExitCode::ValidationRejected.description(),
            ExitCode::ConfigDrift.code(),
            ExitCode::ConfigDrift.description(),
        )
    }
}

// ============================================================================
// Error Codes (String constants for JSON responses)
// ============================================================================

/// Standard error codes for ITSM operations (JSON format)
pub struct ErrorCode;

impl ErrorCode {
    pub const MISSING_REQUIRED_FIELD: &'static str = "MISSING_REQUIRED_FIELD";
    pub const INVALID_WORKFLOW_TRANSITION: &'static str = "INVALID_WORKFLOW_TRANSITION";
    pub const SELF_REFERENCE: &'static str = "SELF_REFERENCE";
    pub const DUPLICATE_EDGE: &'static str = "DUPLICATE_EDGE";
    pub const CIRCULAR_DEPENDENCY: &'static str = "CIRCULAR_DEPENDENCY";
    pub const INVALID_INPUT: &'static str = "INVALID_INPUT";
    pub const WORKFLOW_DRIFT: &'static str = "WORKFLOW_DRIFT";
    pub const NOT_FOUND: &'static str = "NOT_FOUND";
    pub const INVALID_ARGUMENT: &'static str = "INVALID_ARGUMENT";
    pub const IO_ERROR: &'static str = "IO_ERROR";
    pub const PARSE_ERROR: &'static str = "PARSE_ERROR";
}

impl ErrorCode {
    /// Map error code string to exit code
    pub fn to_exit_code(code: &str) -> ExitCode {
        match code {
            Self::NOT_FOUND => ExitCode::NotFound,
            Self::MISSING_REQUIRED_FIELD
            | Self::INVALID_WORKFLOW_TRANSITION
            | Self::SELF_REFERENCE
            | Self::DUPLICATE_EDGE
            | Self::CIRCULAR_DEPENDENCY => ExitCode::ValidationRejected,
            Self::INVALID_INPUT | Self::INVALID_ARGUMENT => ExitCode::InvalidArgument,
            Self::WORKFLOW_DRIFT => ExitCode::ConfigDrift,
            _ => ExitCode::GenericError,
        }
    }
}

/// Helper to create common error responses
impl JsonError {
    pub fn not_found(kind: EntityKind, entity_id: &str, command: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NOT_FOUND,
            format!("{} not found: {}", kind.label(), entity_id),
            command,
        )
        .with_details(serde_json::json!({"kind": kind, "entity_id": entity_id}))
        .with_suggestion("Check if the id is correct")
    }

    /// Build an error response from a validation rejection.
    ///
    /// The error code is the rejection's reason code, so `exit_code()`
    /// distinguishes malformed input from a genuine rejection.
    pub fn rejected(rejection: &Rejection, command: impl Into<String>) -> Self {
        let error = Self::new(rejection.reason.code(), rejection.message.clone(), command);
        match rejection.reason {
            RejectReason::CircularDependency => error
                .with_suggestion("Remove an existing relationship on the path back to the source")
                .with_suggestion("Run 'itsm rel list' to inspect the dependency graph"),
            RejectReason::DuplicateEdge => {
                error.with_suggestion("Run 'itsm rel list' to find the existing relationship")
            }
            _ => error,
        }
    }

    pub fn workflow_drift(drift: &WorkflowDrift, command: impl Into<String>) -> Self {
        Self::new(ErrorCode::WORKFLOW_DRIFT, drift.to_string(), command)
            .with_suggestion("Inspect the stored record and restore a status the workflow knows")
    }
}

/// Metadata included in all responses
#[derive(Debug, Serialize)]
pub struct Metadata {
    /// Timestamp when the response was generated
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: chrono::DateTime<Utc>,
    /// Version of the output format
    pub version: String,
    /// Command that generated this response
    pub command: String,
}

impl Metadata {
    fn new(command: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            version: OUTPUT_VERSION.to_string(),
            command: command.into(),
        }
    }
}

/// Serialize timestamp in ISO 8601 format
fn serialize_timestamp<S>(dt: &chrono::DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

// ============================================================================
// List Response Types
// ============================================================================

/// Response for `issue list` command
#[derive(Debug, Serialize)]
pub struct IssueListResponse {
    pub issues: Vec<crate::domain::Issue>,
    pub count: usize,
}

/// Response for `change list` command
#[derive(Debug, Serialize)]
pub struct ChangeListResponse {
    pub changes: Vec<ChangeRequest>,
    pub count: usize,
}

/// Response for `ci list` command
#[derive(Debug, Serialize)]
pub struct CiListResponse {
    pub items: Vec<ConfigItem>,
    pub count: usize,
}

/// Response for `rel list` command
#[derive(Debug, Serialize)]
pub struct RelationshipListResponse {
    pub relationships: Vec<Relationship>,
    pub count: usize,
}
