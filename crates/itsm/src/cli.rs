//! Command-line interface definitions using clap.

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};

use crate::domain::{EntityKind, FieldMap, FieldValue};
use crate::schema;

/// ITSM Change Tracker
///
/// A repository-local tracker for issues, change requests, and configuration
/// items with workflow enforcement and CMDB dependency validation.
/// Designed for deterministic, machine-friendly outputs and process automation.
///
/// Exit Codes:
///   0  - Command succeeded
///   1  - Generic error occurred
///   2  - Invalid arguments or usage error
///   3  - Resource not found (issue, change, CI, relationship)
///   4  - Mutation rejected by validation
///   5  - Stored state drifted outside the workflow tables
#[derive(Parser)]
#[command(name = "itsm")]
#[command(about = "ITSM change tracker", long_about = None)]
pub struct Cli {
    /// Suppress non-essential output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the tracker in the current directory
    Init,

    /// Issue management commands
    #[command(subcommand)]
    Issue(IssueCommands),

    /// Change request management commands
    #[command(subcommand)]
    Change(ChangeCommands),

    /// Configuration item management commands
    #[command(subcommand)]
    Ci(CiCommands),

    /// CI relationship management commands
    ///
    /// Relationships form the CMDB dependency graph. Every add and edit is
    /// checked against the stored graph: self-references, duplicate edges,
    /// and cycles are refused.
    #[command(subcommand)]
    Rel(RelCommands),

    /// Validate a proposed mutation without applying it
    ///
    /// Runs the exact validation pipeline the mutating commands use and
    /// reports the verdict. Nothing is persisted, rejections exit 0: the
    /// verdict is the result.
    ///
    /// Examples:
    ///   itsm validate issue --set title="Disk full"
    ///   itsm validate issue --id 4f8a --set status=resolved
    ///   itsm validate rel --set source=app-1 --set type=runs-on --set target=vm-1
    Validate {
        /// Entity kind (issue, change, ci, relationship)
        kind: String,

        /// Id of the record being updated (omit for a creation)
        #[arg(long)]
        id: Option<String>,

        /// Field to set (format: field=value, repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Mail gateway commands
    #[command(subcommand)]
    Mail(MailCommands),

    /// Event log commands
    #[command(subcommand)]
    Events(EventCommands),
}

#[derive(Subcommand)]
pub enum IssueCommands {
    /// Create a new issue
    Create {
        #[command(flatten)]
        fields: IssueFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Update an issue
    Update {
        /// Issue ID (full or unique prefix)
        id: String,

        #[command(flatten)]
        fields: IssueFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Show issue details
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List issues
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by assignee
        #[arg(short, long)]
        assigned_to: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

/// Issue field flags shared by create and update
#[derive(Args)]
pub struct IssueFieldArgs {
    /// Short summary
    #[arg(short, long)]
    pub title: Option<String>,

    /// Workflow status (new, in-progress, resolved, closed)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Priority (critical, urgent, bug, feature, wish)
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Assignee
    #[arg(short, long)]
    pub assigned_to: Option<String>,

    /// Affected configuration item id (repeatable)
    #[arg(long = "affected-ci")]
    pub affected_cis: Vec<String>,
}

impl IssueFieldArgs {
    /// Collect the flags that were given into a mutation delta
    pub fn into_deltas(self) -> FieldMap {
        let mut deltas = FieldMap::new();
        insert_text(&mut deltas, "title", self.title);
        insert_text(&mut deltas, "status", self.status);
        insert_text(&mut deltas, "priority", self.priority);
        insert_text(&mut deltas, "assigned_to", self.assigned_to);
        insert_list(&mut deltas, "affected_cis", self.affected_cis);
        deltas
    }
}

#[derive(Subcommand)]
pub enum ChangeCommands {
    /// Create a new change request
    Create {
        #[command(flatten)]
        fields: ChangeFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Update a change request
    Update {
        /// Change request ID (full or unique prefix)
        id: String,

        #[command(flatten)]
        fields: ChangeFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Show change request details
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List change requests
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

/// Change request field flags shared by create and update
#[derive(Args)]
pub struct ChangeFieldArgs {
    /// Short summary
    #[arg(short, long)]
    pub title: Option<String>,

    /// What the change does
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Why the change is needed
    #[arg(long)]
    pub justification: Option<String>,

    /// Expected impact
    #[arg(long)]
    pub impact: Option<String>,

    /// Risk assessment
    #[arg(long)]
    pub risk: Option<String>,

    /// Workflow status (planning, approved, implementing, completed, cancelled)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Priority (low, medium, high, critical)
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Category (software, hardware, configuration, network)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Assignee
    #[arg(short, long)]
    pub assigned_to: Option<String>,

    /// Related issue id (repeatable)
    #[arg(long = "related-issue")]
    pub related_issues: Vec<String>,

    /// Target configuration item id (repeatable)
    #[arg(long = "target-ci")]
    pub target_cis: Vec<String>,
}

impl ChangeFieldArgs {
    /// Collect the flags that were given into a mutation delta
    pub fn into_deltas(self) -> FieldMap {
        let mut deltas = FieldMap::new();
        insert_text(&mut deltas, "title", self.title);
        insert_text(&mut deltas, "description", self.description);
        insert_text(&mut deltas, "justification", self.justification);
        insert_text(&mut deltas, "impact", self.impact);
        insert_text(&mut deltas, "risk", self.risk);
        insert_text(&mut deltas, "status", self.status);
        insert_text(&mut deltas, "priority", self.priority);
        insert_text(&mut deltas, "category", self.category);
        insert_text(&mut deltas, "assigned_to", self.assigned_to);
        insert_list(&mut deltas, "related_issues", self.related_issues);
        insert_list(&mut deltas, "target_cis", self.target_cis);
        deltas
    }
}

#[derive(Subcommand)]
pub enum CiCommands {
    /// Create a new configuration item
    Create {
        #[command(flatten)]
        fields: CiFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Update a configuration item
    Update {
        /// Configuration item ID (full or unique prefix)
        id: String,

        #[command(flatten)]
        fields: CiFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Show configuration item details
    Show {
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List configuration items
    List {
        /// Filter by type
        #[arg(short = 't', long = "type")]
        ci_type: Option<String>,

        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

/// Configuration item field flags shared by create and update
#[derive(Args)]
pub struct CiFieldArgs {
    /// CI name
    #[arg(short, long)]
    pub name: Option<String>,

    /// CI type (server, network-device, storage, software, service, virtual-machine)
    #[arg(short = 't', long = "type")]
    pub ci_type: Option<String>,

    /// Lifecycle status (planning, ordered, in-stock, deployed, active, maintenance, retired)
    #[arg(short, long)]
    pub status: Option<String>,

    /// Physical or logical location
    #[arg(short, long)]
    pub location: Option<String>,

    /// Responsible owner
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Business criticality (very-low, low, medium, high, very-high)
    #[arg(long)]
    pub criticality: Option<String>,

    /// Free-form description
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Primary IP address
    #[arg(long)]
    pub ip_address: Option<String>,

    /// Operating system
    #[arg(long)]
    pub os: Option<String>,

    /// Vendor name
    #[arg(long)]
    pub vendor: Option<String>,

    /// Version string
    #[arg(long)]
    pub version: Option<String>,

    /// CPU core count
    #[arg(long)]
    pub cpu_cores: Option<i64>,

    /// RAM in gigabytes
    #[arg(long)]
    pub ram_gb: Option<i64>,

    /// Open port or port label (repeatable)
    #[arg(long = "port")]
    pub ports: Vec<String>,

    /// Storage capacity in gigabytes
    #[arg(long)]
    pub capacity_gb: Option<i64>,
}

impl CiFieldArgs {
    /// Collect the flags that were given into a mutation delta
    pub fn into_deltas(self) -> FieldMap {
        let mut deltas = FieldMap::new();
        insert_text(&mut deltas, "name", self.name);
        insert_text(&mut deltas, "type", self.ci_type);
        insert_text(&mut deltas, "status", self.status);
        insert_text(&mut deltas, "location", self.location);
        insert_text(&mut deltas, "owner", self.owner);
        insert_text(&mut deltas, "criticality", self.criticality);
        insert_text(&mut deltas, "description", self.description);
        insert_text(&mut deltas, "ip_address", self.ip_address);
        insert_text(&mut deltas, "os", self.os);
        insert_text(&mut deltas, "vendor", self.vendor);
        insert_text(&mut deltas, "version", self.version);
        insert_number(&mut deltas, "cpu_cores", self.cpu_cores);
        insert_number(&mut deltas, "ram_gb", self.ram_gb);
        insert_list(&mut deltas, "ports", self.ports);
        insert_number(&mut deltas, "capacity_gb", self.capacity_gb);
        deltas
    }
}

#[derive(Subcommand)]
pub enum RelCommands {
    /// Add a relationship between two configuration items
    ///
    /// Examples:
    ///   itsm rel add --source app-1 --type runs-on --target vm-1
    ///   itsm rel add --source vm-1 --type depends-on --target san-1 -d "boot volume"
    Add {
        #[command(flatten)]
        fields: RelFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Update a relationship
    Update {
        /// Relationship ID (full or unique prefix)
        id: String,

        #[command(flatten)]
        fields: RelFieldArgs,

        #[arg(long)]
        json: bool,
    },

    /// Remove a relationship
    Remove {
        /// Relationship ID (full or unique prefix)
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// List relationships
    List {
        /// Only relationships touching this CI
        #[arg(long)]
        ci: Option<String>,

        #[arg(long)]
        json: bool,
    },
}

/// Relationship field flags shared by add and update
#[derive(Args)]
pub struct RelFieldArgs {
    /// Source CI id
    #[arg(short, long)]
    pub source: Option<String>,

    /// Relationship type (runs-on, hosts, depends-on, required-by, connects-to, contains, contained-by)
    #[arg(short = 't', long = "type")]
    pub rel_type: Option<String>,

    /// Target CI id
    #[arg(long)]
    pub target: Option<String>,

    /// Free-form description
    #[arg(short = 'd', long)]
    pub description: Option<String>,
}

impl RelFieldArgs {
    /// Collect the flags that were given into a mutation delta
    pub fn into_deltas(self) -> FieldMap {
        let mut deltas = FieldMap::new();
        insert_text(&mut deltas, "source", self.source);
        insert_text(&mut deltas, "type", self.rel_type);
        insert_text(&mut deltas, "target", self.target);
        insert_text(&mut deltas, "description", self.description);
        deltas
    }
}

#[derive(Subcommand)]
pub enum MailCommands {
    /// Ingest one mail reply against an issue
    ///
    /// Extracts a status directive such as [status=resolved] from the
    /// subject and runs it through validation. Strictness for rejected
    /// directives (drop or bounce) comes from config.toml.
    Ingest {
        /// Issue ID the mail replies to
        issue_id: String,

        /// Mail subject line
        subject: String,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum EventCommands {
    /// Tail recent events
    Tail {
        #[arg(short, long, default_value = "10")]
        n: usize,

        #[arg(long)]
        json: bool,
    },
}

fn insert_text(deltas: &mut FieldMap, field: &str, value: Option<String>) {
    if let Some(value) = value {
        deltas.insert(field.to_string(), FieldValue::Text(value));
    }
}

fn insert_number(deltas: &mut FieldMap, field: &str, value: Option<i64>) {
    if let Some(value) = value {
        deltas.insert(field.to_string(), FieldValue::Number(value));
    }
}

/// An omitted repeatable flag leaves the field alone; passing a single
/// empty value clears the stored list
fn insert_list(deltas: &mut FieldMap, field: &str, values: Vec<String>) {
    if values.is_empty() {
        return;
    }
    let items: Vec<String> = values
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect();
    deltas.insert(field.to_string(), FieldValue::List(items));
}

/// Parse one `--set field=value` argument into a typed delta entry
///
/// The value is shaped by the field's schema: list fields split on commas,
/// numeric fields must parse as integers, everything else stays text. An
/// empty value clears the field.
pub fn parse_set_pair(kind: EntityKind, pair: &str) -> Result<(String, FieldValue)> {
    let (field, raw) = pair
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --set argument '{}'. Expected field=value", pair))?;

    let field = field.trim();
    let raw = raw.trim();

    if schema::is_list_field(kind, field) {
        let items: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        return Ok((field.to_string(), FieldValue::List(items)));
    }

    if schema::is_numeric_field(kind, field) && !raw.is_empty() {
        let number: i64 = raw
            .parse()
            .map_err(|_| anyhow!("Invalid value '{}' for {}: expected an integer", raw, field))?;
        return Ok((field.to_string(), FieldValue::Number(number)));
    }

    Ok((field.to_string(), FieldValue::Text(raw.to_string())))
}

/// Parse all `--set` arguments for one proposal
pub fn parse_set_args(kind: EntityKind, pairs: &[String]) -> Result<FieldMap> {
    let mut deltas = FieldMap::new();
    for pair in pairs {
        let (field, value) = parse_set_pair(kind, pair)?;
        deltas.insert(field, value);
    }
    Ok(deltas)
}
