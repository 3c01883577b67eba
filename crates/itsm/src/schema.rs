//! Entity field catalogs and token vocabularies.
//!
//! Every entity kind has a fixed set of known fields, and several fields
//! only accept tokens from a controlled vocabulary. Adapters check incoming
//! deltas against these catalogs before validation proper, so typos surface
//! as argument errors instead of silently storing junk.
//!
//! Issue and change statuses are deliberately absent from the vocabulary
//! table: those tokens belong to the workflow tables, and an unknown
//! proposed status must surface as an invalid transition, not as an
//! argument error.

use anyhow::{anyhow, Result};

use crate::domain::{EntityKind, FieldValue};

/// Issue priority tokens
pub const ISSUE_PRIORITIES: &[&str] = &["critical", "urgent", "bug", "feature", "wish"];

/// Change request priority tokens
pub const CHANGE_PRIORITIES: &[&str] = &["low", "medium", "high", "critical"];

/// Change request category tokens
pub const CHANGE_CATEGORIES: &[&str] = &["software", "hardware", "configuration", "network"];

/// Configuration item type tokens
pub const CI_TYPES: &[&str] = &[
    "server",
    "network-device",
    "storage",
    "software",
    "service",
    "virtual-machine",
];

/// Configuration item lifecycle status tokens
///
/// These are vocabulary, not workflow: any status can move to any other.
pub const CI_STATUSES: &[&str] = &[
    "planning",
    "ordered",
    "in-stock",
    "deployed",
    "active",
    "maintenance",
    "retired",
];

/// Business criticality tokens
pub const CRITICALITY_LEVELS: &[&str] = &["very-low", "low", "medium", "high", "very-high"];

/// Relationship type tokens
pub const RELATIONSHIP_TYPES: &[&str] = &[
    "runs-on",
    "hosts",
    "depends-on",
    "required-by",
    "connects-to",
    "contains",
    "contained-by",
];

/// Known fields per entity kind
pub fn fields_for(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Issue => &["title", "status", "priority", "assigned_to", "affected_cis"],
        EntityKind::Change => &[
            "title",
            "description",
            "justification",
            "impact",
            "risk",
            "status",
            "priority",
            "category",
            "assigned_to",
            "related_issues",
            "target_cis",
        ],
        EntityKind::ConfigItem => &[
            "name",
            "type",
            "status",
            "location",
            "owner",
            "criticality",
            "description",
            "ip_address",
            "os",
            "vendor",
            "version",
            "cpu_cores",
            "ram_gb",
            "ports",
            "capacity_gb",
        ],
        EntityKind::Relationship => &["source", "type", "target", "description"],
    }
}

/// True when the field stores an integer
pub fn is_numeric_field(kind: EntityKind, field: &str) -> bool {
    matches!(
        (kind, field),
        (EntityKind::ConfigItem, "cpu_cores")
            | (EntityKind::ConfigItem, "ram_gb")
            | (EntityKind::ConfigItem, "capacity_gb")
    )
}

/// True when the field stores a list of tokens or ids
pub fn is_list_field(kind: EntityKind, field: &str) -> bool {
    matches!(
        (kind, field),
        (EntityKind::Issue, "affected_cis")
            | (EntityKind::Change, "related_issues")
            | (EntityKind::Change, "target_cis")
            | (EntityKind::ConfigItem, "ports")
    )
}

/// Controlled vocabulary for a field, if it has one
pub fn vocabulary_for(kind: EntityKind, field: &str) -> Option<&'static [&'static str]> {
    match (kind, field) {
        (EntityKind::Issue, "priority") => Some(ISSUE_PRIORITIES),
        (EntityKind::Change, "priority") => Some(CHANGE_PRIORITIES),
        (EntityKind::Change, "category") => Some(CHANGE_CATEGORIES),
        (EntityKind::ConfigItem, "type") => Some(CI_TYPES),
        (EntityKind::ConfigItem, "status") => Some(CI_STATUSES),
        (EntityKind::ConfigItem, "criticality") => Some(CRITICALITY_LEVELS),
        (EntityKind::Relationship, "type") => Some(RELATIONSHIP_TYPES),
        _ => None,
    }
}

/// Check that a field name exists in the kind's catalog
///
/// # Examples
///
/// ```
/// use itsm::domain::EntityKind;
/// use itsm::schema::check_field;
///
/// assert!(check_field(EntityKind::Issue, "title").is_ok());
/// assert!(check_field(EntityKind::Issue, "titel").is_err());
/// ```
pub fn check_field(kind: EntityKind, field: &str) -> Result<()> {
    if fields_for(kind).contains(&field) {
        Ok(())
    } else {
        Err(anyhow!("Unknown {} field: '{}'", kind, field))
    }
}

/// Check a field value against its vocabulary, if it has one
///
/// Blank values pass: they clear optional fields rather than set tokens.
pub fn check_value(kind: EntityKind, field: &str, value: &FieldValue) -> Result<()> {
    let vocab = match vocabulary_for(kind, field) {
        Some(vocab) => vocab,
        None => return Ok(()),
    };

    if value.is_blank() {
        return Ok(());
    }

    let token = value.to_text();
    if vocab.contains(&token.as_str()) {
        Ok(())
    } else {
        Err(anyhow!(
            "Invalid {} '{}' for {}. Expected one of: {}",
            field,
            token,
            kind,
            vocab.join(", ")
        ))
    }
}
