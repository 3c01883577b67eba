//! In-memory storage implementation for testing.
//!
//! This backend stores all data in RAM using HashMaps, providing much faster
//! test execution compared to JSON file I/O. Clones share the same data, so a
//! test can hand one handle to an executor and keep another for assertions.

use crate::domain::{ChangeRequest, ConfigItem, EntityKind, Event, Issue, Relationship};
use crate::storage::EntityStore;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Acquire a lock, recovering the guard if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory storage backend using HashMaps.
///
/// All data is stored in memory and lost when the last handle is dropped.
/// Uses `Arc<Mutex<>>` for shared interior mutability, so handles stay usable
/// across threads and clones share the same data.
///
/// # Examples
///
/// ```
/// use itsm::storage::{EntityStore, InMemoryStorage};
/// use itsm::domain::Issue;
/// use chrono::Utc;
///
/// let storage = InMemoryStorage::new();
/// storage.init().unwrap();
///
/// let mut issue = Issue::new(Utc::now());
/// issue.title = "Test".to_string();
/// storage.save_issue(&issue).unwrap();
///
/// let loaded = storage.load_issue(&issue.id).unwrap();
/// assert_eq!(loaded.title, "Test");
/// ```
#[derive(Clone)]
pub struct InMemoryStorage {
    issues: Arc<Mutex<HashMap<String, Issue>>>,
    changes: Arc<Mutex<HashMap<String, ChangeRequest>>>,
    config_items: Arc<Mutex<HashMap<String, ConfigItem>>>,
    relationships: Arc<Mutex<HashMap<String, Relationship>>>,
    events: Arc<Mutex<Vec<Event>>>,
    /// Nothing is written here; `root()` callers still need a real path
    root: PathBuf,
}

impl InMemoryStorage {
    /// Create a new in-memory storage instance.
    pub fn new() -> Self {
        Self {
            issues: Arc::new(Mutex::new(HashMap::new())),
            changes: Arc::new(Mutex::new(HashMap::new())),
            config_items: Arc::new(Mutex::new(HashMap::new())),
            relationships: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(Mutex::new(Vec::new())),
            root: std::env::temp_dir(),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for InMemoryStorage {
    fn init(&self) -> Result<()> {
        // No initialization needed for in-memory storage
        Ok(())
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn save_issue(&self, issue: &Issue) -> Result<()> {
        lock(&self.issues).insert(issue.id.clone(), issue.clone());
        Ok(())
    }

    fn load_issue(&self, id: &str) -> Result<Issue> {
        lock(&self.issues)
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Issue not found: {}", id))
    }

    fn list_issues(&self) -> Result<Vec<Issue>> {
        Ok(lock(&self.issues).values().cloned().collect())
    }

    fn save_change(&self, change: &ChangeRequest) -> Result<()> {
        lock(&self.changes).insert(change.id.clone(), change.clone());
        Ok(())
    }

    fn load_change(&self, id: &str) -> Result<ChangeRequest> {
        lock(&self.changes)
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Change request not found: {}", id))
    }

    fn list_changes(&self) -> Result<Vec<ChangeRequest>> {
        Ok(lock(&self.changes).values().cloned().collect())
    }

    fn save_config_item(&self, item: &ConfigItem) -> Result<()> {
        lock(&self.config_items).insert(item.id.clone(), item.clone());
        Ok(())
    }

    fn load_config_item(&self, id: &str) -> Result<ConfigItem> {
        lock(&self.config_items)
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Configuration item not found: {}", id))
    }

    fn list_config_items(&self) -> Result<Vec<ConfigItem>> {
        Ok(lock(&self.config_items).values().cloned().collect())
    }

    fn save_relationship(&self, relationship: &Relationship) -> Result<()> {
        lock(&self.relationships).insert(relationship.id.clone(), relationship.clone());
        Ok(())
    }

    fn load_relationship(&self, id: &str) -> Result<Relationship> {
        lock(&self.relationships)
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Relationship not found: {}", id))
    }

    fn list_relationships(&self) -> Result<Vec<Relationship>> {
        Ok(lock(&self.relationships).values().cloned().collect())
    }

    fn delete_relationship(&self, id: &str) -> Result<()> {
        lock(&self.relationships)
            .remove(id)
            .ok_or_else(|| anyhow!("Relationship not found: {}", id))?;
        Ok(())
    }

    fn append_event(&self, event: &Event) -> Result<()> {
        lock(&self.events).push(event.clone());
        Ok(())
    }

    fn read_events(&self) -> Result<Vec<Event>> {
        Ok(lock(&self.events).clone())
    }

    fn resolve_id(&self, kind: EntityKind, partial_id: &str) -> Result<String> {
        let ids: Vec<String> = match kind {
            EntityKind::Issue => lock(&self.issues).keys().cloned().collect(),
            EntityKind::Change => lock(&self.changes).keys().cloned().collect(),
            EntityKind::ConfigItem => lock(&self.config_items).keys().cloned().collect(),
            EntityKind::Relationship => lock(&self.relationships).keys().cloned().collect(),
        };
        super::resolve_partial_id(kind, partial_id, &ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_issue(title: &str) -> Issue {
        let mut issue = Issue::new(Utc::now());
        issue.title = title.to_string();
        issue
    }

    #[test]
    fn test_init_is_noop() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();
        storage.init().unwrap(); // Should be idempotent
    }

    #[test]
    fn test_save_and_load_issue() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let issue = sample_issue("Test");
        storage.save_issue(&issue).unwrap();

        let loaded = storage.load_issue(&issue.id).unwrap();
        assert_eq!(loaded.id, issue.id);
        assert_eq!(loaded.title, "Test");
        assert_eq!(loaded.status, "new");
    }

    #[test]
    fn test_save_updates_existing_issue() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let mut issue = sample_issue("Original");
        storage.save_issue(&issue).unwrap();

        issue.title = "Updated".to_string();
        storage.save_issue(&issue).unwrap();

        let loaded = storage.load_issue(&issue.id).unwrap();
        assert_eq!(loaded.title, "Updated");

        // Should only have one issue
        let issues = storage.list_issues().unwrap();
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_load_nonexistent_issue_fails() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let result = storage.load_issue("nonexistent");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_delete_relationship() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let mut relationship = Relationship::new(Utc::now());
        relationship.source = "ci-a".to_string();
        relationship.rel_type = "hosts".to_string();
        relationship.target = "ci-b".to_string();
        storage.save_relationship(&relationship).unwrap();

        storage.delete_relationship(&relationship.id).unwrap();

        let result = storage.load_relationship(&relationship.id);
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_nonexistent_relationship_fails() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let result = storage.delete_relationship("nonexistent");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_list_issues() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let issue1 = sample_issue("Issue 1");
        let issue2 = sample_issue("Issue 2");

        storage.save_issue(&issue1).unwrap();
        storage.save_issue(&issue2).unwrap();

        let issues = storage.list_issues().unwrap();
        assert_eq!(issues.len(), 2);

        let titles: Vec<_> = issues.iter().map(|i| i.title.as_str()).collect();
        assert!(titles.contains(&"Issue 1"));
        assert!(titles.contains(&"Issue 2"));
    }

    #[test]
    fn test_list_issues_empty() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let issues = storage.list_issues().unwrap();
        assert_eq!(issues.len(), 0);
    }

    #[test]
    fn test_multiple_events() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        storage
            .append_event(&Event::new_entity_created(EntityKind::Issue, "issue-1"))
            .unwrap();
        storage
            .append_event(&Event::new_entity_created(EntityKind::Change, "change-1"))
            .unwrap();

        let events = storage.read_events().unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_clone_shares_storage() {
        let storage1 = InMemoryStorage::new();
        storage1.init().unwrap();

        let issue1 = sample_issue("Issue 1");
        storage1.save_issue(&issue1).unwrap();

        // Clone shares the same underlying storage (via Arc)
        let storage2 = storage1.clone();
        let loaded = storage2.load_issue(&issue1.id).unwrap();
        assert_eq!(loaded.title, "Issue 1");

        // Verify they share the same underlying storage
        let issue2 = sample_issue("Issue 2");
        storage2.save_issue(&issue2).unwrap();

        let issues1 = storage1.list_issues().unwrap();
        let issues2 = storage2.list_issues().unwrap();
        assert_eq!(issues1.len(), 2);
        assert_eq!(issues2.len(), 2);
    }

    #[test]
    fn test_works_with_complex_config_item_state() {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();

        let mut item = ConfigItem::new(Utc::now());
        item.name = "web-01".to_string();
        item.ci_type = "server".to_string();
        item.status = "active".to_string();
        item.location = Some("rack-4".to_string());
        item.criticality = Some("very-high".to_string());
        item.ip_address = Some("10.0.0.12".to_string());
        item.cpu_cores = Some(16);
        item.ports = vec!["80".to_string(), "443".to_string()];

        storage.save_config_item(&item).unwrap();

        let loaded = storage.load_config_item(&item.id).unwrap();
        assert_eq!(loaded.name, "web-01");
        assert_eq!(loaded.status, "active");
        assert_eq!(loaded.location, Some("rack-4".to_string()));
        assert_eq!(loaded.criticality, Some("very-high".to_string()));
        assert_eq!(loaded.cpu_cores, Some(16));
        assert_eq!(loaded.ports.len(), 2);
    }
}
