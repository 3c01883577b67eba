//! Core domain types for the ITSM tracker.
//!
//! This module defines the fundamental data structures used throughout the
//! system: entity records (issues, change requests, configuration items, CI
//! relationships), proposed mutations, and validation verdicts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::workflow::{ChangeStatus, IssueStatus};

/// The kind of entity a mutation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Support/incident issue
    Issue,
    /// Change request
    Change,
    /// Configuration item (CMDB node)
    ConfigItem,
    /// Directed relationship between two configuration items
    Relationship,
}

impl EntityKind {
    /// Stable token used in storage paths, CLI arguments, and JSON payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Issue => "issue",
            EntityKind::Change => "change",
            EntityKind::ConfigItem => "config-item",
            EntityKind::Relationship => "relationship",
        }
    }

    /// Human-readable label for error messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Issue => "Issue",
            EntityKind::Change => "Change request",
            EntityKind::ConfigItem => "Configuration item",
            EntityKind::Relationship => "Relationship",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value in a proposed mutation or record snapshot
///
/// Values arrive untyped from adapters (CLI flags, JSON bodies, mail
/// directives), so this is deliberately loose: text, integer, or a list of
/// tokens for multilink fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text or a vocabulary token
    Text(String),
    /// Integer value (cpu cores, capacity, ...)
    Number(i64),
    /// Multilink value (ids or tokens)
    List(Vec<String>),
}

impl FieldValue {
    /// Borrow the text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as owned text
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::List(items) => items.join(", "),
        }
    }

    /// Coerce the value to a list of tokens
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::List(items) => items.clone(),
            FieldValue::Text(s) => vec![s.clone()],
            FieldValue::Number(n) => vec![n.to_string()],
        }
    }

    /// Coerce the value to an integer, if it parses as one
    pub fn to_number(&self) -> Option<i64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::List(_) => None,
        }
    }

    /// True when the value carries no usable content
    ///
    /// Text is blank when it is empty after trimming. Lists are blank when
    /// empty. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
            FieldValue::List(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Field name to value map, ordered for deterministic serialization
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A proposed mutation against one entity
///
/// This is the single input shape every adapter reduces to before calling
/// the validation engine. A create carries no `existing_id`; an update names
/// the record it touches and lists only the fields it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedChange {
    /// Entity kind being mutated
    pub kind: EntityKind,
    /// Id of the record being updated, absent for creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_id: Option<String>,
    /// Fields being set, keyed by field name
    #[serde(default)]
    pub deltas: FieldMap,
}

impl ProposedChange {
    /// Build a creation proposal
    pub fn create(kind: EntityKind, deltas: FieldMap) -> Self {
        Self {
            kind,
            existing_id: None,
            deltas,
        }
    }

    /// Build an update proposal against an existing record
    pub fn update(kind: EntityKind, existing_id: impl Into<String>, deltas: FieldMap) -> Self {
        Self {
            kind,
            existing_id: Some(existing_id.into()),
            deltas,
        }
    }

    /// True when this proposal creates a new record
    pub fn is_create(&self) -> bool {
        self.existing_id.is_none()
    }

    /// True when the delta sets the named field
    pub fn touches(&self, field: &str) -> bool {
        self.deltas.contains_key(field)
    }
}

/// Why a mutation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// A required field is absent or blank
    MissingRequiredField,
    /// The proposed status is not reachable from the current one
    InvalidWorkflowTransition,
    /// A relationship pointing a CI at itself
    SelfReference,
    /// A relationship duplicating an existing (source, type, target) triple
    DuplicateEdge,
    /// A relationship that would close a cycle in the dependency graph
    CircularDependency,
    /// Structurally malformed input (missing relationship endpoints)
    InvalidInput,
}

impl RejectReason {
    /// Machine-readable code shared by all adapters
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            RejectReason::InvalidWorkflowTransition => "INVALID_WORKFLOW_TRANSITION",
            RejectReason::SelfReference => "SELF_REFERENCE",
            RejectReason::DuplicateEdge => "DUPLICATE_EDGE",
            RejectReason::CircularDependency => "CIRCULAR_DEPENDENCY",
            RejectReason::InvalidInput => "INVALID_INPUT",
        }
    }
}

/// A rejected mutation: the reason category plus the canonical message
///
/// Messages are produced here and nowhere else. Adapters render them
/// verbatim, so the same bad mutation reads identically over the CLI, the
/// REST API, and the mail gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct Rejection {
    /// Reason category
    pub reason: RejectReason,
    /// Human-readable explanation
    pub message: String,
}

impl Rejection {
    /// A required field is absent or blank
    pub fn missing_field(field: &str) -> Self {
        Self {
            reason: RejectReason::MissingRequiredField,
            message: format!("{} is required", capitalize(field)),
        }
    }

    /// The workflow table does not allow this status change
    pub fn invalid_transition(current: &str, proposed: &str) -> Self {
        Self {
            reason: RejectReason::InvalidWorkflowTransition,
            message: format!("Invalid status transition: {} -> {}", current, proposed),
        }
    }

    /// A relationship proposal with missing or blank endpoints
    pub fn incomplete_endpoints() -> Self {
        Self {
            reason: RejectReason::InvalidInput,
            message: "source, target, and type are required fields".to_string(),
        }
    }

    /// A relationship from a CI to itself
    pub fn self_reference() -> Self {
        Self {
            reason: RejectReason::SelfReference,
            message: "A CI cannot have a relationship with itself".to_string(),
        }
    }

    /// An exact duplicate of an existing relationship
    pub fn duplicate_edge() -> Self {
        Self {
            reason: RejectReason::DuplicateEdge,
            message: "A relationship with the same source, target, and type already exists"
                .to_string(),
        }
    }

    /// A relationship that would close a dependency cycle
    pub fn circular_dependency() -> Self {
        Self {
            reason: RejectReason::CircularDependency,
            message: "Circular dependency detected. This relationship would create a cycle \
                      in the dependency graph."
                .to_string(),
        }
    }
}

/// Outcome of validating one proposed mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The mutation may be applied
    Accepted,
    /// The mutation must not be applied
    Rejected(Rejection),
}

impl Verdict {
    /// True when the mutation passed every check
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Borrow the rejection, if there is one
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(rejection) => Some(rejection),
        }
    }
}

impl From<Rejection> for Verdict {
    fn from(rejection: Rejection) -> Self {
        Verdict::Rejected(rejection)
    }
}

/// Stored state that no workflow table can account for
///
/// This is a configuration error, not a rejection: the mutation itself is
/// not at fault, the system is. It propagates as a hard error so operators
/// see it instead of end users.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowDrift {
    /// The stored current status is not a state the workflow knows
    #[error("Unknown {kind} workflow state: {status}")]
    UnknownState {
        /// Entity kind whose workflow was consulted
        kind: EntityKind,
        /// The unrecognized status token
        status: String,
    },
    /// A transition check was demanded for a kind with no workflow table
    #[error("No workflow table for kind: {kind}")]
    MissingTable {
        /// The offending kind
        kind: EntityKind,
    },
}

/// An issue record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier (UUID)
    pub id: String,
    /// Short summary
    pub title: String,
    /// Current workflow status token
    pub status: String,
    /// Priority token
    pub priority: Option<String>,
    /// Person the issue is assigned to
    pub assigned_to: Option<String>,
    /// Ids of configuration items this issue affects
    pub affected_cis: Vec<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl Issue {
    /// Create an empty issue in the initial workflow state
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            status: IssueStatus::New.as_str().to_string(),
            priority: None,
            assigned_to: None,
            affected_cis: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot the record as a field map for validation
    pub fn snapshot(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("title".to_string(), self.title.as_str().into());
        fields.insert("status".to_string(), self.status.as_str().into());
        if let Some(priority) = &self.priority {
            fields.insert("priority".to_string(), priority.as_str().into());
        }
        if let Some(assigned_to) = &self.assigned_to {
            fields.insert("assigned_to".to_string(), assigned_to.as_str().into());
        }
        if !self.affected_cis.is_empty() {
            fields.insert("affected_cis".to_string(), self.affected_cis.clone().into());
        }
        fields
    }

    /// Overlay an accepted delta onto the record
    pub fn apply(&mut self, deltas: &FieldMap) {
        for (field, value) in deltas {
            match field.as_str() {
                "title" => self.title = value.to_text(),
                "status" => self.status = value.to_text(),
                "priority" => self.priority = optional_text(value),
                "assigned_to" => self.assigned_to = optional_text(value),
                "affected_cis" => self.affected_cis = value.to_list(),
                _ => {}
            }
        }
    }
}

/// A change request record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Unique identifier (UUID)
    pub id: String,
    /// Short summary
    pub title: String,
    /// Current workflow status token
    pub status: String,
    /// What the change does
    pub description: Option<String>,
    /// Why the change is needed
    pub justification: Option<String>,
    /// Expected impact of the change
    pub impact: Option<String>,
    /// Risk assessment
    pub risk: Option<String>,
    /// Priority token
    pub priority: Option<String>,
    /// Category token
    pub category: Option<String>,
    /// Person the change is assigned to
    pub assigned_to: Option<String>,
    /// Ids of issues this change addresses
    pub related_issues: Vec<String>,
    /// Ids of configuration items this change targets
    pub target_cis: Vec<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl ChangeRequest {
    /// Create an empty change request in the initial workflow state
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            status: ChangeStatus::Planning.as_str().to_string(),
            description: None,
            justification: None,
            impact: None,
            risk: None,
            priority: None,
            category: None,
            assigned_to: None,
            related_issues: Vec::new(),
            target_cis: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot the record as a field map for validation
    pub fn snapshot(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("title".to_string(), self.title.as_str().into());
        fields.insert("status".to_string(), self.status.as_str().into());
        insert_optional(&mut fields, "description", &self.description);
        insert_optional(&mut fields, "justification", &self.justification);
        insert_optional(&mut fields, "impact", &self.impact);
        insert_optional(&mut fields, "risk", &self.risk);
        insert_optional(&mut fields, "priority", &self.priority);
        insert_optional(&mut fields, "category", &self.category);
        insert_optional(&mut fields, "assigned_to", &self.assigned_to);
        if !self.related_issues.is_empty() {
            fields.insert(
                "related_issues".to_string(),
                self.related_issues.clone().into(),
            );
        }
        if !self.target_cis.is_empty() {
            fields.insert("target_cis".to_string(), self.target_cis.clone().into());
        }
        fields
    }

    /// Overlay an accepted delta onto the record
    pub fn apply(&mut self, deltas: &FieldMap) {
        for (field, value) in deltas {
            match field.as_str() {
                "title" => self.title = value.to_text(),
                "status" => self.status = value.to_text(),
                "description" => self.description = optional_text(value),
                "justification" => self.justification = optional_text(value),
                "impact" => self.impact = optional_text(value),
                "risk" => self.risk = optional_text(value),
                "priority" => self.priority = optional_text(value),
                "category" => self.category = optional_text(value),
                "assigned_to" => self.assigned_to = optional_text(value),
                "related_issues" => self.related_issues = value.to_list(),
                "target_cis" => self.target_cis = value.to_list(),
                _ => {}
            }
        }
    }
}

/// A configuration item record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigItem {
    /// Unique identifier (UUID)
    pub id: String,
    /// CI name
    pub name: String,
    /// CI type token
    #[serde(rename = "type")]
    pub ci_type: String,
    /// Lifecycle status token
    pub status: String,
    /// Physical or logical location
    pub location: Option<String>,
    /// Responsible owner
    pub owner: Option<String>,
    /// Business criticality token
    pub criticality: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Primary IP address
    pub ip_address: Option<String>,
    /// Operating system
    pub os: Option<String>,
    /// Vendor name
    pub vendor: Option<String>,
    /// Version string
    pub version: Option<String>,
    /// CPU core count
    pub cpu_cores: Option<i64>,
    /// RAM in gigabytes
    pub ram_gb: Option<i64>,
    /// Open ports or port labels
    pub ports: Vec<String>,
    /// Storage capacity in gigabytes
    pub capacity_gb: Option<i64>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl ConfigItem {
    /// Create an empty configuration item
    ///
    /// Unlike issues and changes, CIs have no workflow table and therefore
    /// no initial status. The status arrives in the creation delta, which
    /// the required-field audit guarantees.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            ci_type: String::new(),
            status: String::new(),
            location: None,
            owner: None,
            criticality: None,
            description: None,
            ip_address: None,
            os: None,
            vendor: None,
            version: None,
            cpu_cores: None,
            ram_gb: None,
            ports: Vec::new(),
            capacity_gb: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot the record as a field map for validation
    pub fn snapshot(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("name".to_string(), self.name.as_str().into());
        fields.insert("type".to_string(), self.ci_type.as_str().into());
        fields.insert("status".to_string(), self.status.as_str().into());
        insert_optional(&mut fields, "location", &self.location);
        insert_optional(&mut fields, "owner", &self.owner);
        insert_optional(&mut fields, "criticality", &self.criticality);
        insert_optional(&mut fields, "description", &self.description);
        insert_optional(&mut fields, "ip_address", &self.ip_address);
        insert_optional(&mut fields, "os", &self.os);
        insert_optional(&mut fields, "vendor", &self.vendor);
        insert_optional(&mut fields, "version", &self.version);
        if let Some(cpu_cores) = self.cpu_cores {
            fields.insert("cpu_cores".to_string(), cpu_cores.into());
        }
        if let Some(ram_gb) = self.ram_gb {
            fields.insert("ram_gb".to_string(), ram_gb.into());
        }
        if !self.ports.is_empty() {
            fields.insert("ports".to_string(), self.ports.clone().into());
        }
        if let Some(capacity_gb) = self.capacity_gb {
            fields.insert("capacity_gb".to_string(), capacity_gb.into());
        }
        fields
    }

    /// Overlay an accepted delta onto the record
    pub fn apply(&mut self, deltas: &FieldMap) {
        for (field, value) in deltas {
            match field.as_str() {
                "name" => self.name = value.to_text(),
                "type" => self.ci_type = value.to_text(),
                "status" => self.status = value.to_text(),
                "location" => self.location = optional_text(value),
                "owner" => self.owner = optional_text(value),
                "criticality" => self.criticality = optional_text(value),
                "description" => self.description = optional_text(value),
                "ip_address" => self.ip_address = optional_text(value),
                "os" => self.os = optional_text(value),
                "vendor" => self.vendor = optional_text(value),
                "version" => self.version = optional_text(value),
                "cpu_cores" => self.cpu_cores = value.to_number(),
                "ram_gb" => self.ram_gb = value.to_number(),
                "ports" => self.ports = value.to_list(),
                "capacity_gb" => self.capacity_gb = value.to_number(),
                _ => {}
            }
        }
    }
}

/// A directed relationship between two configuration items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier (UUID)
    pub id: String,
    /// Id of the source CI
    pub source: String,
    /// Relationship type token
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Id of the target CI
    pub target: String,
    /// Free-form description
    pub description: Option<String>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Create an empty relationship
    ///
    /// Endpoints arrive in the creation delta; the graph guard rejects the
    /// proposal before this record is ever persisted if they are missing.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: String::new(),
            rel_type: String::new(),
            target: String::new(),
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Snapshot the record as a field map for validation
    pub fn snapshot(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("source".to_string(), self.source.as_str().into());
        fields.insert("type".to_string(), self.rel_type.as_str().into());
        fields.insert("target".to_string(), self.target.as_str().into());
        insert_optional(&mut fields, "description", &self.description);
        fields
    }

    /// Overlay an accepted delta onto the record
    pub fn apply(&mut self, deltas: &FieldMap) {
        for (field, value) in deltas {
            match field.as_str() {
                "source" => self.source = value.to_text(),
                "type" => self.rel_type = value.to_text(),
                "target" => self.target = value.to_text(),
                "description" => self.description = optional_text(value),
                _ => {}
            }
        }
    }
}

fn insert_optional(fields: &mut FieldMap, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        fields.insert(name.to_string(), value.as_str().into());
    }
}

/// Blank text clears an optional field instead of storing whitespace
fn optional_text(value: &FieldValue) -> Option<String> {
    if value.is_blank() {
        None
    } else {
        Some(value.to_text())
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// System event types for the mutation journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new record was created
    EntityCreated {
        /// Event ID
        id: String,
        /// Kind of the created record
        kind: EntityKind,
        /// Record that was created
        entity_id: String,
        /// When this occurred
        timestamp: DateTime<Utc>,
    },
    /// An existing record was modified
    EntityUpdated {
        /// Event ID
        id: String,
        /// Kind of the modified record
        kind: EntityKind,
        /// Record that was modified
        entity_id: String,
        /// When this occurred
        timestamp: DateTime<Utc>,
        /// Names of the fields that changed
        fields: Vec<String>,
    },
    /// A workflow status moved from one state to another
    StatusChanged {
        /// Event ID
        id: String,
        /// Kind of the record
        kind: EntityKind,
        /// Record whose status changed
        entity_id: String,
        /// When this occurred
        timestamp: DateTime<Utc>,
        /// Previous status token
        from: String,
        /// New status token
        to: String,
    },
    /// A CI relationship was removed
    RelationshipRemoved {
        /// Event ID
        id: String,
        /// Relationship that was removed
        entity_id: String,
        /// When this occurred
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    /// Create an entity created event
    pub fn new_entity_created(kind: EntityKind, entity_id: impl Into<String>) -> Self {
        Event::EntityCreated {
            id: Uuid::new_v4().to_string(),
            kind,
            entity_id: entity_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an entity updated event
    pub fn new_entity_updated(
        kind: EntityKind,
        entity_id: impl Into<String>,
        fields: Vec<String>,
    ) -> Self {
        Event::EntityUpdated {
            id: Uuid::new_v4().to_string(),
            kind,
            entity_id: entity_id.into(),
            timestamp: Utc::now(),
            fields,
        }
    }

    /// Create a status changed event
    pub fn new_status_changed(
        kind: EntityKind,
        entity_id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Event::StatusChanged {
            id: Uuid::new_v4().to_string(),
            kind,
            entity_id: entity_id.into(),
            timestamp: Utc::now(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a relationship removed event
    pub fn new_relationship_removed(entity_id: impl Into<String>) -> Self {
        Event::RelationshipRemoved {
            id: Uuid::new_v4().to_string(),
            entity_id: entity_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Get the entity ID associated with this event
    pub fn get_entity_id(&self) -> &str {
        match self {
            Event::EntityCreated { entity_id, .. } => entity_id,
            Event::EntityUpdated { entity_id, .. } => entity_id,
            Event::StatusChanged { entity_id, .. } => entity_id,
            Event::RelationshipRemoved { entity_id, .. } => entity_id,
        }
    }

    /// Get the event type as a string
    pub fn get_type(&self) -> &str {
        match self {
            Event::EntityCreated { .. } => "entity_created",
            Event::EntityUpdated { .. } => "entity_updated",
            Event::StatusChanged { .. } => "status_changed",
            Event::RelationshipRemoved { .. } => "relationship_removed",
        }
    }
}
