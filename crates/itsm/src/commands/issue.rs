//! Issue CRUD operations

use super::*;
use crate::workflow::IssueStatus;

impl<S: EntityStore> CommandExecutor<S> {
    /// Create an issue from a creation delta
    ///
    /// An explicit status in the delta is validated as a transition out of
    /// the initial state, so `status=in-progress` works at creation but
    /// `status=resolved` does not.
    pub fn create_issue(&self, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::Issue, &deltas)?;

        let change = ProposedChange::create(EntityKind::Issue, deltas);
        require_accepted(engine::validate(&change, &ValidationContext::new())?)?;

        let mut issue = Issue::new(Utc::now());
        issue.apply(&change.deltas);
        self.storage.save_issue(&issue)?;

        self.storage
            .append_event(&Event::new_entity_created(EntityKind::Issue, &issue.id))?;
        if issue.status != IssueStatus::New.as_str() {
            self.storage.append_event(&Event::new_status_changed(
                EntityKind::Issue,
                &issue.id,
                IssueStatus::New.as_str(),
                &issue.status,
            ))?;
        }

        Ok(issue.id)
    }

    /// Update issue fields, validating the delta against the stored record
    pub fn update_issue(&self, id: &str, deltas: FieldMap) -> Result<String> {
        check_deltas(EntityKind::Issue, &deltas)?;

        let full_id = self.storage.resolve_id(EntityKind::Issue, id)?;
        let mut issue = self.storage.load_issue(&full_id)?;

        let current = issue.snapshot();
        let change = ProposedChange::update(EntityKind::Issue, full_id.clone(), deltas);
        let ctx = ValidationContext::new().with_current(&current);
        require_accepted(engine::validate(&change, &ctx)?)?;

        let old_status = issue.status.clone();
        issue.apply(&change.deltas);
        issue.updated_at = Utc::now();
        self.storage.save_issue(&issue)?;

        let fields = change.deltas.keys().cloned().collect();
        self.storage.append_event(&Event::new_entity_updated(
            EntityKind::Issue,
            &issue.id,
            fields,
        ))?;
        if issue.status != old_status {
            self.storage.append_event(&Event::new_status_changed(
                EntityKind::Issue,
                &issue.id,
                &old_status,
                &issue.status,
            ))?;
        }

        Ok(full_id)
    }

    pub fn show_issue(&self, id: &str) -> Result<Issue> {
        let full_id = self.storage.resolve_id(EntityKind::Issue, id)?;
        self.storage.load_issue(&full_id)
    }

    pub fn list_issues(
        &self,
        status_filter: Option<&str>,
        assigned_to_filter: Option<&str>,
    ) -> Result<Vec<Issue>> {
        let issues = self.storage.list_issues()?;

        let filtered = issues
            .into_iter()
            .filter(|issue| {
                if let Some(status) = status_filter {
                    if issue.status != status {
                        return false;
                    }
                }
                if let Some(assigned_to) = assigned_to_filter {
                    if issue.assigned_to.as_deref() != Some(assigned_to) {
                        return false;
                    }
                }
                true
            })
            .collect();

        Ok(filtered)
    }
}
