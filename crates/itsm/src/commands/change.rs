//! Change request CRUD operations

use super::*;
use crate::workflow::ChangeStatus;

impl<S: EntityStore> CommandExecutor<S> {
    /// Create a change request from a creation delta
    pub fn create_change(&self, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::Change, &deltas)?;

        let change = ProposedChange::create(EntityKind::Change, deltas);
        require_accepted(engine::validate(&change, &ValidationContext::new())?)?;

        let mut record = ChangeRequest::new(Utc::now());
        record.apply(&change.deltas);
        self.storage.save_change(&record)?;

        self.storage
            .append_event(&Event::new_entity_created(EntityKind::Change, &record.id))?;
        if record.status != ChangeStatus::Planning.as_str() {
            self.storage.append_event(&Event::new_status_changed(
                EntityKind::Change,
                &record.id,
                ChangeStatus::Planning.as_str(),
                &record.status,
            ))?;
        }

        Ok(record.id)
    }

    /// Update change request fields, validating the delta against the stored record
    pub fn update_change(&self, id: &str, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::Change, &deltas)?;

        let full_id = self.storage.resolve_id(EntityKind::Change, id)?;
        let mut record = self.storage.load_change(&full_id)?;

        let current = record.snapshot();
        let change = ProposedChange::update(EntityKind::Change, full_id.clone(), deltas);
        let ctx = ValidationContext::new().with_current(&current);
        require_accepted(engine::validate(&change, &ctx)?)?;

        let old_status = record.status.clone();
        record.apply(&change.deltas);
        record.updated_at = Utc::now();
        self.storage.save_change(&record)?;

        let fields = change.deltas.keys().cloned().collect();
        self.storage.append_event(&Event::new_entity_updated(
            EntityKind::Change,
            &record.id,
            fields,
        ))?;
        if record.status != old_status {
            self.storage.append_event(&Event::new_status_changed(
                EntityKind::Change,
                &record.id,
                &old_status,
                &record.status,
            ))?;
        }

        Ok(full_id)
    }

    pub fn show_change(&self, id: &str) -> Result<ChangeRequest> {
        let full_id = self.storage.resolve_id(EntityKind::Change, id)?;
        self.storage.load_change(&full_id)
    }

    pub fn list_changes(&self, status_filter: Option<&str>) -> Result<Vec<ChangeRequest>> {
        let changes = self.storage.list_changes()?;

        let filtered = changes
            .into_iter()
            .filter(|change| match status_filter {
                Some(status) => change.status == status,
                None => true,
            })
            .collect();

        Ok(filtered)
    }
}
