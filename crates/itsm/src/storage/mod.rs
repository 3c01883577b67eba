//! Storage abstraction layer for persisting tracker records and events.
//!
//! This module defines the `EntityStore` trait that abstracts storage
//! operations, allowing different backends (JSON files, in-memory, etc.) to
//! be used interchangeably by the command layer and the HTTP server.

use anyhow::Result;

use crate::domain::{ChangeRequest, ConfigItem, EntityKind, Event, Issue, Relationship};
use crate::graph::{DependencyGraph, Edge};

pub mod json;
pub mod memory;

// Re-export for convenience
pub use json::JsonFileStorage;
pub use memory::InMemoryStorage;

/// Trait for storage backends that persist tracker records and events.
///
/// This trait decouples the validation and command layers from the specific
/// storage implementation. Implementations must be `Clone` to support shared
/// access patterns.
///
/// # Examples
///
/// ```no_run
/// use chrono::Utc;
/// use itsm::domain::Issue;
/// use itsm::storage::{EntityStore, JsonFileStorage};
///
/// let storage = JsonFileStorage::new(".itsm");
/// storage.init().unwrap();
///
/// let mut issue = Issue::new(Utc::now());
/// issue.title = "Web server down".to_string();
/// storage.save_issue(&issue).unwrap();
///
/// let loaded = storage.load_issue(&issue.id).unwrap();
/// assert_eq!(loaded.title, "Web server down");
/// ```
pub trait EntityStore: Clone {
    /// Initialize the storage backend (idempotent).
    ///
    /// Creates necessary directories and files.
    fn init(&self) -> Result<()>;

    /// Get the root directory path for this storage backend.
    ///
    /// Returns the path where configuration files are stored. For file-based
    /// storage this is the data directory; for in-memory storage it is a
    /// temporary path.
    fn root(&self) -> &std::path::Path;

    /// Save an issue (create or update).
    fn save_issue(&self, issue: &Issue) -> Result<()>;

    /// Load an issue by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue does not exist or cannot be deserialized.
    fn load_issue(&self, id: &str) -> Result<Issue>;

    /// List all issues.
    fn list_issues(&self) -> Result<Vec<Issue>>;

    /// Save a change request (create or update).
    fn save_change(&self, change: &ChangeRequest) -> Result<()>;

    /// Load a change request by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the change does not exist or cannot be deserialized.
    fn load_change(&self, id: &str) -> Result<ChangeRequest>;

    /// List all change requests.
    fn list_changes(&self) -> Result<Vec<ChangeRequest>>;

    /// Save a configuration item (create or update).
    fn save_config_item(&self, item: &ConfigItem) -> Result<()>;

    /// Load a configuration item by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the item does not exist or cannot be deserialized.
    fn load_config_item(&self, id: &str) -> Result<ConfigItem>;

    /// List all configuration items.
    fn list_config_items(&self) -> Result<Vec<ConfigItem>>;

    /// Save a relationship (create or update).
    fn save_relationship(&self, relationship: &Relationship) -> Result<()>;

    /// Load a relationship by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the relationship does not exist or cannot be
    /// deserialized.
    fn load_relationship(&self, id: &str) -> Result<Relationship>;

    /// List all relationships.
    fn list_relationships(&self) -> Result<Vec<Relationship>>;

    /// Delete a relationship by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the relationship does not exist or cannot be
    /// deleted.
    fn delete_relationship(&self, id: &str) -> Result<()>;

    /// Append an event to the event log.
    fn append_event(&self, event: &Event) -> Result<()>;

    /// Read all events from the event log.
    fn read_events(&self) -> Result<Vec<Event>>;

    /// Resolve a partial entity ID to its full UUID.
    ///
    /// Accepts either a full ID or a unique prefix (minimum 4 characters).
    /// Returns the full ID if a unique match is found.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use itsm::domain::{EntityKind, Issue};
    /// use itsm::storage::{EntityStore, InMemoryStorage};
    ///
    /// let storage = InMemoryStorage::new();
    /// storage.init().unwrap();
    ///
    /// let mut issue = Issue::new(Utc::now());
    /// issue.title = "Switch port flapping".to_string();
    /// storage.save_issue(&issue).unwrap();
    ///
    /// let full_id = storage.resolve_id(EntityKind::Issue, &issue.id[..8]).unwrap();
    /// assert_eq!(full_id, issue.id);
    /// ```
    ///
    /// # Errors
    ///
    /// - Prefix too short (< 4 chars): "Invalid ID prefix ..."
    /// - No matching record: "{Kind} not found: {prefix}"
    /// - Multiple records match: "Ambiguous ID '{prefix}' ..."
    fn resolve_id(&self, kind: EntityKind, partial_id: &str) -> Result<String>;

    /// Build the dependency graph from all stored relationships.
    ///
    /// The graph is the "rest of the graph" that relationship mutations are
    /// validated against.
    fn load_graph(&self) -> Result<DependencyGraph> {
        let relationships = self.list_relationships()?;
        Ok(DependencyGraph::from_edges(
            relationships.iter().map(Edge::from).collect(),
        ))
    }
}

/// Resolve a partial ID against a list of known IDs.
///
/// An exact match always wins, even for short IDs. Prefix matching requires
/// at least 4 characters to avoid surprising matches.
fn resolve_partial_id(kind: EntityKind, partial_id: &str, ids: &[String]) -> Result<String> {
    if ids.iter().any(|id| id == partial_id) {
        return Ok(partial_id.to_string());
    }

    if partial_id.len() < 4 {
        anyhow::bail!(
            "Invalid ID prefix '{}': must be at least 4 characters",
            partial_id
        );
    }

    let matches: Vec<&String> = ids.iter().filter(|id| id.starts_with(partial_id)).collect();
    match matches.len() {
        0 => anyhow::bail!("{} not found: {}", kind.label(), partial_id),
        1 => Ok(matches[0].clone()),
        _ => anyhow::bail!(
            "Ambiguous ID '{}' matches multiple {} records: {}",
            partial_id,
            kind,
            matches
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_trait_save_and_load() {
        fn test_with_storage<S: EntityStore>(storage: S) {
            storage.init().unwrap();

            let mut issue = Issue::new(Utc::now());
            issue.title = "Trait test".to_string();
            issue.priority = Some("urgent".to_string());

            storage.save_issue(&issue).unwrap();
            let loaded = storage.load_issue(&issue.id).unwrap();

            assert_eq!(loaded.title, issue.title);
            assert_eq!(loaded.priority, Some("urgent".to_string()));
            assert_eq!(loaded.status, "new");
        }

        // Test with both backends
        let temp_dir = tempfile::tempdir().unwrap();
        test_with_storage(JsonFileStorage::new(temp_dir.path()));
        test_with_storage(InMemoryStorage::new());
    }

    #[test]
    fn test_trait_all_kinds_round_trip() {
        fn test_with_storage<S: EntityStore>(storage: S) {
            storage.init().unwrap();
            let now = Utc::now();

            let mut change = ChangeRequest::new(now);
            change.title = "Replace core switch".to_string();
            storage.save_change(&change).unwrap();
            assert_eq!(storage.load_change(&change.id).unwrap().status, "planning");

            let mut item = ConfigItem::new(now);
            item.name = "db-01".to_string();
            item.ci_type = "server".to_string();
            item.status = "active".to_string();
            storage.save_config_item(&item).unwrap();
            assert_eq!(storage.load_config_item(&item.id).unwrap().name, "db-01");

            let mut relationship = Relationship::new(now);
            relationship.source = "a".to_string();
            relationship.rel_type = "depends-on".to_string();
            relationship.target = "b".to_string();
            storage.save_relationship(&relationship).unwrap();
            let loaded = storage.load_relationship(&relationship.id).unwrap();
            assert_eq!(loaded.rel_type, "depends-on");

            assert_eq!(storage.list_changes().unwrap().len(), 1);
            assert_eq!(storage.list_config_items().unwrap().len(), 1);
            assert_eq!(storage.list_relationships().unwrap().len(), 1);
        }

        // Test with both backends
        let temp_dir = tempfile::tempdir().unwrap();
        test_with_storage(JsonFileStorage::new(temp_dir.path()));
        test_with_storage(InMemoryStorage::new());
    }

    #[test]
    fn test_trait_delete_relationship() {
        fn test_with_storage<S: EntityStore>(storage: S) {
            storage.init().unwrap();

            let mut relationship = Relationship::new(Utc::now());
            relationship.source = "a".to_string();
            relationship.rel_type = "hosts".to_string();
            relationship.target = "b".to_string();
            storage.save_relationship(&relationship).unwrap();

            storage.delete_relationship(&relationship.id).unwrap();

            assert!(storage.load_relationship(&relationship.id).is_err());
            assert!(storage.list_relationships().unwrap().is_empty());
        }

        // Test with both backends
        let temp_dir = tempfile::tempdir().unwrap();
        test_with_storage(JsonFileStorage::new(temp_dir.path()));
        test_with_storage(InMemoryStorage::new());
    }

    #[test]
    fn test_trait_event_log() {
        fn test_with_storage<S: EntityStore>(storage: S) {
            storage.init().unwrap();

            let event = Event::new_entity_created(EntityKind::Issue, "issue-1");
            storage.append_event(&event).unwrap();

            let events = storage.read_events().unwrap();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].get_entity_id(), "issue-1");
        }

        // Test with both backends
        let temp_dir = tempfile::tempdir().unwrap();
        test_with_storage(JsonFileStorage::new(temp_dir.path()));
        test_with_storage(InMemoryStorage::new());
    }

    #[test]
    fn test_trait_load_graph() {
        fn test_with_storage<S: EntityStore>(storage: S) {
            storage.init().unwrap();
            let now = Utc::now();

            let mut first = Relationship::new(now);
            first.source = "web-01".to_string();
            first.rel_type = "runs-on".to_string();
            first.target = "host-01".to_string();
            storage.save_relationship(&first).unwrap();

            let mut second = Relationship::new(now);
            second.source = "host-01".to_string();
            second.rel_type = "depends-on".to_string();
            second.target = "san-01".to_string();
            storage.save_relationship(&second).unwrap();

            let graph = storage.load_graph().unwrap();
            assert_eq!(graph.len(), 2);
        }

        // Test with both backends
        let temp_dir = tempfile::tempdir().unwrap();
        test_with_storage(JsonFileStorage::new(temp_dir.path()));
        test_with_storage(InMemoryStorage::new());
    }

    #[test]
    fn test_trait_resolve_id() {
        fn test_with_storage<S: EntityStore>(storage: S) {
            storage.init().unwrap();

            let mut issue = Issue::new(Utc::now());
            issue.id = "aaaa1111-0000-0000-0000-000000000001".to_string();
            issue.title = "First".to_string();
            storage.save_issue(&issue).unwrap();

            let mut other = Issue::new(Utc::now());
            other.id = "aaaa2222-0000-0000-0000-000000000002".to_string();
            other.title = "Second".to_string();
            storage.save_issue(&other).unwrap();

            // Unique prefix resolves
            let resolved = storage.resolve_id(EntityKind::Issue, "aaaa1").unwrap();
            assert_eq!(resolved, issue.id);

            // Full ID resolves to itself
            let resolved = storage.resolve_id(EntityKind::Issue, &other.id).unwrap();
            assert_eq!(resolved, other.id);

            // Shared prefix is ambiguous
            let err = storage
                .resolve_id(EntityKind::Issue, "aaaa")
                .unwrap_err()
                .to_string();
            assert!(err.contains("Ambiguous"));

            // Too short
            let err = storage
                .resolve_id(EntityKind::Issue, "aa")
                .unwrap_err()
                .to_string();
            assert!(err.contains("at least 4 characters"));

            // Unknown prefix
            let err = storage
                .resolve_id(EntityKind::Issue, "zzzz")
                .unwrap_err()
                .to_string();
            assert!(err.contains("Issue not found: zzzz"));
        }

        // Test with both backends
        let temp_dir = tempfile::tempdir().unwrap();
        test_with_storage(JsonFileStorage::new(temp_dir.path()));
        test_with_storage(InMemoryStorage::new());
    }

    #[test]
    fn test_resolve_partial_id_exact_match_wins_over_length_rule() {
        let ids = vec!["ab".to_string(), "abcd1234".to_string()];
        let resolved = resolve_partial_id(EntityKind::Issue, "ab", &ids).unwrap();
        assert_eq!(resolved, "ab");
    }

    #[test]
    fn test_resolve_partial_id_kind_appears_in_error() {
        let ids: Vec<String> = Vec::new();
        let err = resolve_partial_id(EntityKind::ConfigItem, "dead", &ids)
            .unwrap_err()
            .to_string();
        assert_eq!(err, "Configuration item not found: dead");
    }
}
