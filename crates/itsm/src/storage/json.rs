//! JSON file-based storage implementation.
//!
//! All data is stored as JSON files in a `data/` directory with atomic writes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::domain::{ChangeRequest, ConfigItem, EntityKind, Event, Issue, Relationship};
use crate::errors::{data_dir_not_initialized, storage_layout_broken};
use crate::storage::EntityStore;

const ISSUES_DIR: &str = "data/issues";
const CHANGES_DIR: &str = "data/changes";
const CIS_DIR: &str = "data/cis";
const RELATIONSHIPS_DIR: &str = "data/relationships";
const INDEX_FILE: &str = "data/index.json";
const EVENTS_FILE: &str = "data/events.jsonl";

fn kind_dir(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Issue => ISSUES_DIR,
        EntityKind::Change => CHANGES_DIR,
        EntityKind::ConfigItem => CIS_DIR,
        EntityKind::Relationship => RELATIONSHIPS_DIR,
    }
}

/// Index of all records in the repository
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Index {
    /// Schema version for future migrations
    schema_version: u32,
    /// All issue IDs
    issue_ids: Vec<String>,
    /// All change request IDs
    change_ids: Vec<String>,
    /// All configuration item IDs
    ci_ids: Vec<String>,
    /// All relationship IDs
    relationship_ids: Vec<String>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            schema_version: 1,
            issue_ids: Vec::new(),
            change_ids: Vec::new(),
            ci_ids: Vec::new(),
            relationship_ids: Vec::new(),
        }
    }
}

impl Index {
    fn ids(&self, kind: EntityKind) -> &Vec<String> {
        match kind {
            EntityKind::Issue => &self.issue_ids,
            EntityKind::Change => &self.change_ids,
            EntityKind::ConfigItem => &self.ci_ids,
            EntityKind::Relationship => &self.relationship_ids,
        }
    }

    fn ids_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::Issue => &mut self.issue_ids,
            EntityKind::Change => &mut self.change_ids,
            EntityKind::ConfigItem => &mut self.ci_ids,
            EntityKind::Relationship => &mut self.relationship_ids,
        }
    }
}

/// JSON file-based storage for tracker records and events.
///
/// Each record is stored as a separate JSON file under `data/<kind>/`, the
/// ID index in `data/index.json`, and events in `data/events.jsonl`.
/// All file writes are atomic (write to temp file, then rename).
#[derive(Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    /// Create a new JSON file storage instance at the given root path
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Check that an initialized data directory exists at the root.
    ///
    /// Called before every command except `init`.
    pub fn validate(&self) -> Result<()> {
        let index_path = self.root.join(INDEX_FILE);
        if !self.root.exists() || !index_path.exists() {
            return Err(data_dir_not_initialized(&self.root).into());
        }

        for dir in [ISSUES_DIR, CHANGES_DIR, CIS_DIR, RELATIONSHIPS_DIR] {
            let path = self.root.join(dir);
            if !path.exists() {
                return Err(storage_layout_broken(&path).into());
            }
        }

        Ok(())
    }

    fn record_path(&self, kind: EntityKind, id: &str) -> PathBuf {
        self.root.join(kind_dir(kind)).join(format!("{}.json", id))
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json).context("Failed to write temporary file")?;
        fs::rename(&temp_path, path).context("Failed to rename temporary file")?;

        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<T> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to deserialize data")
    }

    fn load_index(&self) -> Result<Index> {
        let index_path = self.root.join(INDEX_FILE);
        self.read_json(&index_path)
    }

    fn save_index(&self, index: &Index) -> Result<()> {
        let index_path = self.root.join(INDEX_FILE);
        self.write_json(&index_path, index)
    }

    fn track_id(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut index = self.load_index()?;
        let ids = index.ids_mut(kind);
        if !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
            self.save_index(&index)?;
        }
        Ok(())
    }
}

impl EntityStore for JsonFileStorage {
    fn init(&self) -> Result<()> {
        for dir in [ISSUES_DIR, CHANGES_DIR, CIS_DIR, RELATIONSHIPS_DIR] {
            fs::create_dir_all(self.root.join(dir))
                .with_context(|| format!("Failed to create directory: {}", dir))?;
        }

        // Create index.json if it doesn't exist
        let index_path = self.root.join(INDEX_FILE);
        if !index_path.exists() {
            let index = Index::default();
            self.write_json(&index_path, &index)?;
        }

        // Create events.jsonl if it doesn't exist
        let events_path = self.root.join(EVENTS_FILE);
        if !events_path.exists() {
            fs::File::create(&events_path).context("Failed to create events file")?;
        }

        Ok(())
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn save_issue(&self, issue: &Issue) -> Result<()> {
        let path = self.record_path(EntityKind::Issue, &issue.id);
        self.write_json(&path, issue)?;
        self.track_id(EntityKind::Issue, &issue.id)
    }

    fn load_issue(&self, id: &str) -> Result<Issue> {
        self.read_json(&self.record_path(EntityKind::Issue, id))
    }

    fn list_issues(&self) -> Result<Vec<Issue>> {
        let index = self.load_index()?;
        index
            .ids(EntityKind::Issue)
            .iter()
            .map(|id| self.load_issue(id))
            .collect()
    }

    fn save_change(&self, change: &ChangeRequest) -> Result<()> {
        let path = self.record_path(EntityKind::Change, &change.id);
        self.write_json(&path, change)?;
        self.track_id(EntityKind::Change, &change.id)
    }

    fn load_change(&self, id: &str) -> Result<ChangeRequest> {
        self.read_json(&self.record_path(EntityKind::Change, id))
    }

    fn list_changes(&self) -> Result<Vec<ChangeRequest>> {
        let index = self.load_index()?;
        index
            .ids(EntityKind::Change)
            .iter()
            .map(|id| self.load_change(id))
            .collect()
    }

    fn save_config_item(&self, item: &ConfigItem) -> Result<()> {
        let path = self.record_path(EntityKind::ConfigItem, &item.id);
        self.write_json(&path, item)?;
        self.track_id(EntityKind::ConfigItem, &item.id)
    }

    fn load_config_item(&self, id: &str) -> Result<ConfigItem> {
        self.read_json(&self.record_path(EntityKind::ConfigItem, id))
    }

    fn list_config_items(&self) -> Result<Vec<ConfigItem>> {
        let index = self.load_index()?;
        index
            .ids(EntityKind::ConfigItem)
            .iter()
            .map(|id| self.load_config_item(id))
            .collect()
    }

    fn save_relationship(&self, relationship: &Relationship) -> Result<()> {
        let path = self.record_path(EntityKind::Relationship, &relationship.id);
        self.write_json(&path, relationship)?;
        self.track_id(EntityKind::Relationship, &relationship.id)
    }

    fn load_relationship(&self, id: &str) -> Result<Relationship> {
        self.read_json(&self.record_path(EntityKind::Relationship, id))
    }

    fn list_relationships(&self) -> Result<Vec<Relationship>> {
        let index = self.load_index()?;
        index
            .ids(EntityKind::Relationship)
            .iter()
            .map(|id| self.load_relationship(id))
            .collect()
    }

    fn delete_relationship(&self, id: &str) -> Result<()> {
        let path = self.record_path(EntityKind::Relationship, id);
        fs::remove_file(&path).context("Failed to delete relationship file")?;

        // Update index
        let mut index = self.load_index()?;
        index.ids_mut(EntityKind::Relationship).retain(|i| i != id);
        self.save_index(&index)?;

        Ok(())
    }

    fn append_event(&self, event: &Event) -> Result<()> {
        let events_path = self.root.join(EVENTS_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&events_path)
            .context("Failed to open events file")?;

        let json = serde_json::to_string(event).context("Failed to serialize event")?;
        writeln!(file, "{}", json).context("Failed to write event")?;
        Ok(())
    }

    fn read_events(&self) -> Result<Vec<Event>> {
        let events_path = self.root.join(EVENTS_FILE);
        if !events_path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&events_path).context("Failed to open events file")?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line.context("Failed to read line from events file")?;
            if line.trim().is_empty() {
                continue;
            }
            let event: Event =
                serde_json::from_str(&line).context("Failed to deserialize event")?;
            events.push(event);
        }

        Ok(events)
    }

    fn resolve_id(&self, kind: EntityKind, partial_id: &str) -> Result<String> {
        let index = self.load_index()?;
        super::resolve_partial_id(kind, partial_id, index.ids(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, JsonFileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path());
        (temp_dir, storage)
    }

    fn sample_issue(title: &str) -> Issue {
        let mut issue = Issue::new(Utc::now());
        issue.title = title.to_string();
        issue
    }

    #[test]
    fn test_init_creates_directory_structure() {
        let (_temp, storage) = setup_storage();

        storage.init().unwrap();

        assert!(storage.root.join(ISSUES_DIR).exists());
        assert!(storage.root.join(CHANGES_DIR).exists());
        assert!(storage.root.join(CIS_DIR).exists());
        assert!(storage.root.join(RELATIONSHIPS_DIR).exists());
        assert!(storage.root.join(INDEX_FILE).exists());
        assert!(storage.root.join(EVENTS_FILE).exists());
    }

    #[test]
    fn test_init_is_idempotent() {
        let (_temp, storage) = setup_storage();

        storage.init().unwrap();
        let issue = sample_issue("Survives re-init");
        storage.save_issue(&issue).unwrap();

        storage.init().unwrap();

        assert_eq!(storage.list_issues().unwrap().len(), 1);
    }

    #[test]
    fn test_validate_uninitialized_directory() {
        let (_temp, storage) = setup_storage();

        let err = storage.validate().unwrap_err().to_string();
        assert!(err.contains("itsm init"));
    }

    #[test]
    fn test_validate_after_init() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        storage.validate().unwrap();
    }

    #[test]
    fn test_validate_detects_missing_subdirectory() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        fs::remove_dir_all(storage.root.join(RELATIONSHIPS_DIR)).unwrap();

        let err = storage.validate().unwrap_err().to_string();
        assert!(err.contains("incomplete"));
        assert!(err.contains("relationships"));
    }

    #[test]
    fn test_save_and_load_issue() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        let issue = sample_issue("Test Issue");
        let issue_id = issue.id.clone();

        storage.save_issue(&issue).unwrap();
        let loaded = storage.load_issue(&issue_id).unwrap();

        assert_eq!(loaded.id, issue.id);
        assert_eq!(loaded.title, issue.title);
        assert_eq!(loaded.status, "new");
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        let issue = sample_issue("Atomic");
        storage.save_issue(&issue).unwrap();

        let temp_path = storage
            .record_path(EntityKind::Issue, &issue.id)
            .with_extension("json.tmp");
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_save_issue_twice_doesnt_duplicate_in_index() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        let mut issue = sample_issue("Test");
        storage.save_issue(&issue).unwrap();

        issue.title = "Updated".to_string();
        storage.save_issue(&issue).unwrap();

        let index = storage.load_index().unwrap();
        assert_eq!(
            index.issue_ids.iter().filter(|id| *id == &issue.id).count(),
            1
        );
    }

    #[test]
    fn test_list_issues_returns_all_issues() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        let issue1 = sample_issue("Issue 1");
        let issue2 = sample_issue("Issue 2");

        storage.save_issue(&issue1).unwrap();
        storage.save_issue(&issue2).unwrap();

        let issues = storage.list_issues().unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.id == issue1.id));
        assert!(issues.iter().any(|i| i.id == issue2.id));
    }

    #[test]
    fn test_delete_relationship_removes_file_and_updates_index() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        let mut relationship = Relationship::new(Utc::now());
        relationship.source = "a".to_string();
        relationship.rel_type = "depends-on".to_string();
        relationship.target = "b".to_string();
        let rel_id = relationship.id.clone();

        storage.save_relationship(&relationship).unwrap();
        assert!(storage
            .record_path(EntityKind::Relationship, &rel_id)
            .exists());

        storage.delete_relationship(&rel_id).unwrap();
        assert!(!storage
            .record_path(EntityKind::Relationship, &rel_id)
            .exists());

        let index = storage.load_index().unwrap();
        assert!(!index.relationship_ids.contains(&rel_id));
    }

    #[test]
    fn test_load_nonexistent_issue_returns_error() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        let result = storage.load_issue("nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_records_survive_new_instance() {
        let temp_dir = TempDir::new().unwrap();

        {
            let storage = JsonFileStorage::new(temp_dir.path());
            storage.init().unwrap();
            let mut item = ConfigItem::new(Utc::now());
            item.id = "ci-persistent".to_string();
            item.name = "db-01".to_string();
            item.ci_type = "server".to_string();
            item.status = "active".to_string();
            storage.save_config_item(&item).unwrap();
        }

        let reopened = JsonFileStorage::new(temp_dir.path());
        let loaded = reopened.load_config_item("ci-persistent").unwrap();
        assert_eq!(loaded.name, "db-01");
        assert_eq!(reopened.list_config_items().unwrap().len(), 1);
    }

    #[test]
    fn test_event_log_appends_lines() {
        let (_temp, storage) = setup_storage();
        storage.init().unwrap();

        storage
            .append_event(&Event::new_entity_created(EntityKind::Issue, "issue-1"))
            .unwrap();
        storage
            .append_event(&Event::new_status_changed(
                EntityKind::Issue,
                "issue-1",
                "new",
                "in-progress",
            ))
            .unwrap();

        let events = storage.read_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get_type(), "entity_created");
        assert_eq!(events[1].get_type(), "status_changed");
    }
}
