//! Dry-run validation
//!
//! `validate_proposal` runs a proposal through the exact pipeline the
//! mutating commands use, but persists nothing and logs nothing. A rejected
//! proposal is a successful dry run: the verdict is the result.

use super::*;

impl<S: EntityStore> CommandExecutor<S> {
    /// Validate a proposal against current storage state without applying it
    ///
    /// Returns the verdict for well-posed proposals, rejections included.
    /// Errors are reserved for malformed input (unknown fields, bad
    /// vocabulary tokens), missing records, and workflow drift.
    pub fn validate_proposal(&self, proposal: &ProposedChange) -> Result<Verdict> {
        check_deltas(proposal.kind, &proposal.deltas)?;

        // Resolve the id up front so the engine excludes the right stored
        // edge when a relationship update resubmits its own triple
        let mut proposal = proposal.clone();
        let current = match proposal.existing_id.take() {
            Some(partial) => {
                let full_id = self.storage.resolve_id(proposal.kind, &partial)?;
                let snapshot = self.load_snapshot(proposal.kind, &full_id)?;
                proposal.existing_id = Some(full_id);
                Some(snapshot)
            }
            None => None,
        };

        let graph = match proposal.kind {
            EntityKind::Relationship => Some(self.storage.load_graph()?),
            _ => None,
        };

        let mut ctx = ValidationContext::new();
        if let Some(current) = &current {
            ctx = ctx.with_current(current);
        }
        if let Some(graph) = &graph {
            ctx = ctx.with_graph(graph);
        }

        Ok(engine::validate(&proposal, &ctx)?)
    }

    fn load_snapshot(&self, kind: EntityKind, id: &str) -> Result<FieldMap> {
        let snapshot = match kind {
            EntityKind::Issue => self.storage.load_issue(id)?.snapshot(),
            EntityKind::Change => self.storage.load_change(id)?.snapshot(),
            EntityKind::ConfigItem => self.storage.load_config_item(id)?.snapshot(),
            EntityKind::Relationship => self.storage.load_relationship(id)?.snapshot(),
        };
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RejectReason, WorkflowDrift};
    use crate::storage::InMemoryStorage;
    use chrono::Utc;

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

    #[test]
    fn test_dry_run_accepts_valid_creation() {
        let executor = executor();

        let proposal = ProposedChange::create(EntityKind::Issue, delta(&[("title", "x")]));
        let verdict = executor.validate_proposal(&proposal).unwrap();
        assert_eq!(verdict, Verdict::Accepted);

        // Nothing was persisted or logged
        assert!(executor.list_issues(None, None).unwrap().is_empty());
        assert!(executor.storage().read_events().unwrap().is_empty());
    }

    #[test]
    fn test_dry_run_returns_rejection_as_a_verdict_not_an_error() {
        let executor = executor();

        let proposal = ProposedChange::create(EntityKind::Issue, FieldMap::new());
        let verdict = executor.validate_proposal(&proposal).unwrap();

        let rejection = verdict.rejection().unwrap();
        assert_eq!(rejection.reason, RejectReason::MissingRequiredField);
        assert_eq!(rejection.message, "Title is required");
    }

    #[test]
    fn test_dry_run_update_reads_the_stored_snapshot() {
        let executor = executor();
        let id = executor.create_issue(delta(&[("title", "x")])).unwrap();
        executor
            .update_issue(&id, delta(&[("status", "in-progress")]))
            .unwrap();

        let proposal =
            ProposedChange::update(EntityKind::Issue, id.clone(), delta(&[("status", "resolved")]));
        assert_eq!(
            executor.validate_proposal(&proposal).unwrap(),
            Verdict::Accepted
        );

        let proposal =
            ProposedChange::update(EntityKind::Issue, id.clone(), delta(&[("status", "closed")]));
        let verdict = executor.validate_proposal(&proposal).unwrap();
        assert_eq!(
            verdict.rejection().unwrap().message,
            "Invalid status transition: in-progress -> closed"
        );

        // The dry run left the record alone
        assert_eq!(executor.show_issue(&id).unwrap().status, "in-progress");
    }

    #[test]
    fn test_dry_run_relationship_update_excludes_its_own_edge() {
        let executor = executor();
        let id = executor
            .add_relationship(delta(&[
                ("source", "a"),
                ("type", "depends-on"),
                ("target", "b"),
            ]))
            .unwrap();

        // Resubmitting the stored triple through a prefix id still resolves
        // to the full id, so the edge is excluded from the duplicate check
        let proposal = ProposedChange::update(
            EntityKind::Relationship,
            &id[..8],
            delta(&[("source", "a"), ("type", "depends-on"), ("target", "b")]),
        );
        assert_eq!(
            executor.validate_proposal(&proposal).unwrap(),
            Verdict::Accepted
        );
    }

    #[test]
    fn test_dry_run_against_missing_record_is_an_error() {
        let executor = executor();

        let proposal =
            ProposedChange::update(EntityKind::Issue, "deadbeef", delta(&[("title", "x")]));
        let err = executor.validate_proposal(&proposal).unwrap_err();
        assert!(err.to_string().contains("Issue not found"));
    }

    #[test]
    fn test_dry_run_surfaces_workflow_drift() {
        let executor = executor();

        // Corrupt the stored record behind the engine's back
        let mut issue = crate::domain::Issue::new(Utc::now());
        issue.title = "x".to_string();
        issue.status = "limbo".to_string();
        executor.storage().save_issue(&issue).unwrap();

        let proposal = ProposedChange::update(
            EntityKind::Issue,
            issue.id.clone(),
            delta(&[("status", "closed")]),
        );
        let err = executor.validate_proposal(&proposal).unwrap_err();
        let drift = err.downcast_ref::<WorkflowDrift>().unwrap();
        assert_eq!(
            *drift,
            WorkflowDrift::UnknownState {
                kind: EntityKind::Issue,
                status: "limbo".to_string(),
            }
        );
    }
}
