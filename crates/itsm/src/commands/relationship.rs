//! Relationship graph operations
//!
//! Adds and edits run against the full stored graph, so duplicate edges and
//! cycles are caught before anything is persisted. Removal is always legal.

use super::*;

impl<S: EntityStore> CommandExecutor<S> {
    /// Add a relationship between two configuration items
    pub fn add_relationship(&self, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::Relationship, &deltas)?;

        let graph = self.storage.load_graph()?;
        let change = ProposedChange::create(EntityKind::Relationship, deltas);
        let ctx = ValidationContext::new().with_graph(&graph);
        require_accepted(engine::validate(&change, &ctx)?)?;

        let mut relationship = Relationship::new(Utc::now());
        relationship.apply(&change.deltas);
        self.storage.save_relationship(&relationship)?;

        self.storage.append_event(&Event::new_entity_created(
            EntityKind::Relationship,
            &relationship.id,
        ))?;

        Ok(relationship.id)
    }

    /// Update relationship fields, re-checking the graph when an endpoint
    /// or the type moves
    pub fn update_relationship(&self, id: &str, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::Relationship, &deltas)?;

        let full_id = self.storage.resolve_id(EntityKind::Relationship, id)?;
        let mut relationship = self.storage.load_relationship(&full_id)?;

        let graph = self.storage.load_graph()?;
        let current = relationship.snapshot();
        let change = ProposedChange::update(EntityKind::Relationship, full_id.clone(), deltas);
        let ctx = ValidationContext::new()
            .with_current(&current)
            .with_graph(&graph);
        require_accepted(engine::validate(&change, &ctx)?)?;

        relationship.apply(&change.deltas);
        relationship.updated_at = Utc::now();
        self.storage.save_relationship(&relationship)?;

        let fields = change.deltas.keys().cloned().collect();
        self.storage.append_event(&Event::new_entity_updated(
            EntityKind::Relationship,
            &relationship.id,
            fields,
        ))?;

        Ok(full_id)
    }

    /// Remove a relationship
    pub fn remove_relationship(&self, id: &str) -> Result<String> {
        let full_id = self.storage.resolve_id(EntityKind::Relationship, id)?;
        self.storage.delete_relationship(&full_id)?;
        self.storage
            .append_event(&Event::new_relationship_removed(&full_id))?;
        Ok(full_id)
    }

    pub fn show_relationship(&self, id: &str) -> Result<Relationship> {
        let full_id = self.storage.resolve_id(EntityKind::Relationship, id)?;
        self.storage.load_relationship(&full_id)
    }

    /// List relationships, optionally only those touching one CI
    pub fn list_relationships(&self, ci_filter: Option<&str>) -> Result<Vec<Relationship>> {
        let relationships = self.storage.list_relationships()?;

        let filtered = relationships
            .into_iter()
            .filter(|rel| match ci_filter {
                Some(ci) => rel.source == ci || rel.target == ci,
                None => true,
            })
            .collect();

        Ok(filtered)
    }
}
