//! Configuration item CRUD operations

use super::*;

impl<S: EntityStore> CommandExecutor<S> {
    /// Create a configuration item from a creation delta
    ///
    /// CIs have no workflow: status is plain vocabulary and must arrive in
    /// the creation delta alongside name and type.
    pub fn create_config_item(&self, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::ConfigItem, &deltas)?;

        let change = ProposedChange::create(EntityKind::ConfigItem, deltas);
        require_accepted(engine::validate(&change, &ValidationContext::new())?)?;

        let mut item = ConfigItem::new(Utc::now());
        item.apply(&change.deltas);
        self.storage.save_config_item(&item)?;

        self.storage.append_event(&Event::new_entity_created(
            EntityKind::ConfigItem,
            &item.id,
        ))?;

        Ok(item.id)
    }

    /// Update configuration item fields
    pub fn update_config_item(&self, id: &str, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::ConfigItem, &deltas)?;

        let full_id = self.storage.resolve_id(EntityKind::ConfigItem, id)?;
        let mut item = self.storage.load_config_item(&full_id)?;

        let current = item.snapshot();
        let change = ProposedChange::update(EntityKind::ConfigItem, full_id.clone(), deltas);
        let ctx = ValidationContext::new().with_current(&current);
        require_accepted(engine::validate(&change, &ctx)?)?;

        let old_status = item.status.clone();
        item.apply(&change.deltas);
        item.updated_at = Utc::now();
        self.storage.save_config_item(&item)?;

        let fields = change.deltas.keys().cloned().collect();
        self.storage.append_event(&Event::new_entity_updated(
            EntityKind::ConfigItem,
            &item.id,
            fields,
        ))?;
        if item.status != old_status {
            self.storage.append_event(&Event::new_status_changed(
                EntityKind::ConfigItem,
                &item.id,
                &old_status,
                &item.status,
            ))?;
        }

        Ok(full_id)
    }

    pub fn show_config_item(&self, id: &str) -> Result<ConfigItem> {
        let full_id = self.storage.resolve_id(EntityKind::ConfigItem, id)?;
        self.storage.load_config_item(&full_id)
    }

    pub fn list_config_items(
        &self,
        type_filter: Option<&str>,
        status_filter: Option<&str>,
    ) -> Result<Vec<ConfigItem>> {
        let items = self.storage.list_config_items()?;

        let filtered = items
            .into_iter()
            .filter(|item| {
                if let Some(ci_type) = type_filter {
                    if item.ci_type != ci_type {
                        return false;
                    }
                }
                if let Some(status) = status_filter {
                    if item.status != status {
                        return false;
                    }
                }
                true
            })
            .collect();

        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FieldValue, RejectReason, Rejection};
    use crate::storage::InMemoryStorage;

    fn executor() -> CommandExecutor<InMemoryStorage> {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();
        CommandExecutor::new(storage)
    }

    fn delta(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), (*v).into()))
            .collect()
    }

    fn server_delta(name: &str) -> FieldMap {
        delta(&[("name", name), ("type", "server"), ("status", "active")])
    }

    #[test]
    fn test_create_config_item() {
        let executor = executor();

        let id = executor.create_config_item(server_delta("web-01")).unwrap();

        let item = executor.show_config_item(&id).unwrap();
        assert_eq!(item.name, "web-01");
        assert_eq!(item.ci_type, "server");
        assert_eq!(item.status, "active");
    }

    #[test]
    fn test_create_config_item_requires_name_type_and_status() {
        let executor = executor();

        // Missing fields are reported in declaration order: name first
        let err = executor
            .create_config_item(delta(&[("status", "active")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Name is required");

        let err = executor
            .create_config_item(delta(&[("name", "web-01"), ("type", "server")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Status is required");
        assert_eq!(
            err.downcast_ref::<Rejection>().map(|r| r.reason),
            Some(RejectReason::MissingRequiredField)
        );
    }

    #[test]
    fn test_create_config_item_rejects_unknown_type_token() {
        let executor = executor();

        let err = executor
            .create_config_item(delta(&[
                ("name", "web-01"),
                ("type", "mainframe"),
                ("status", "active"),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid type 'mainframe'"));
    }

    #[test]
    fn test_config_item_status_is_vocabulary_not_workflow() {
        let executor = executor();
        let id = executor.create_config_item(server_delta("web-01")).unwrap();

        // Any vocabulary status is reachable from any other
        executor
            .update_config_item(&id, delta(&[("status", "retired")]))
            .unwrap();
        executor
            .update_config_item(&id, delta(&[("status", "planning")]))
            .unwrap();

        let item = executor.show_config_item(&id).unwrap();
        assert_eq!(item.status, "planning");

        // But tokens outside the vocabulary are refused
        let err = executor
            .update_config_item(&id, delta(&[("status", "zombie")]))
            .unwrap_err();
        assert!(err.to_string().contains("Invalid status 'zombie'"));
    }

    #[test]
    fn test_config_item_numeric_fields() {
        let executor = executor();
        let mut deltas = server_delta("db-01");
        deltas.insert("cpu_cores".to_string(), FieldValue::Number(32));
        deltas.insert("ram_gb".to_string(), "128".into());

        let id = executor.create_config_item(deltas).unwrap();

        let item = executor.show_config_item(&id).unwrap();
        assert_eq!(item.cpu_cores, Some(32));
        assert_eq!(item.ram_gb, Some(128));
    }

    #[test]
    fn test_config_item_blank_status_update_is_rejected() {
        let executor = executor();
        let id = executor.create_config_item(server_delta("web-01")).unwrap();

        let err = executor
            .update_config_item(&id, delta(&[("status", "")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Status is required");
    }

    #[test]
    fn test_list_config_items_filters() {
        let executor = executor();
        executor.create_config_item(server_delta("web-01")).unwrap();
        executor.create_config_item(server_delta("web-02")).unwrap();
        executor
            .create_config_item(delta(&[
                ("name", "edge-fw"),
                ("type", "network-device"),
                ("status", "maintenance"),
            ]))
            .unwrap();

        assert_eq!(executor.list_config_items(None, None).unwrap().len(), 3);
        assert_eq!(
            executor
                .list_config_items(Some("server"), None)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            executor
                .list_config_items(None, Some("maintenance"))
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            executor
                .list_config_items(Some("server"), Some("maintenance"))
                .unwrap()
                .len(),
            0
        );
    }
}
