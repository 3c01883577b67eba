//! The validation engine.
//!
//! [`validate`] is the one gate every mutation passes through, no matter
//! which adapter produced it. It is a pure function over the proposal and a
//! read-only context snapshot: no storage access, no clock, no mutation.
//! Checks run in a fixed order and the first failure wins: required-field
//! audit, workflow transition, graph guard. The caller owns atomicity; the
//! engine only promises that the same inputs always produce the same
//! verdict.

use crate::audit;
use crate::domain::{EntityKind, FieldMap, ProposedChange, Rejection, Verdict, WorkflowDrift};
use crate::graph::DependencyGraph;
use crate::workflow;

/// Read-only state a validation runs against
///
/// `current` is the stored snapshot of the record being updated; it stays
/// absent for creations. `graph` is the CI dependency graph and is only
/// consulted for relationship mutations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// Snapshot of the record being updated
    pub current: Option<&'a FieldMap>,
    /// The dependency graph to validate relationship edges against
    pub graph: Option<&'a DependencyGraph>,
}

impl<'a> ValidationContext<'a> {
    /// An empty context, sufficient for creations of non-relationship kinds
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the stored snapshot of the record being updated
    pub fn with_current(mut self, current: &'a FieldMap) -> Self {
        self.current = Some(current);
        self
    }

    /// Attach the dependency graph
    pub fn with_graph(mut self, graph: &'a DependencyGraph) -> Self {
        self.graph = Some(graph);
        self
    }
}

/// Validate one proposed mutation
///
/// Returns `Ok(Verdict)` for every well-posed call, including rejections.
/// The only `Err` is [`WorkflowDrift`]: stored state the workflow tables
/// cannot account for, which is an operator problem rather than a bad
/// mutation.
pub fn validate(
    change: &ProposedChange,
    ctx: &ValidationContext,
) -> Result<Verdict, WorkflowDrift> {
    if let Some(rejection) =
        audit::check_required_fields(change.kind, change.is_create(), &change.deltas)
    {
        return Ok(rejection.into());
    }

    if workflow::has_workflow(change.kind) {
        if let Some(proposed) = change.deltas.get("status") {
            let proposed = proposed.to_text();
            let current = current_status(change, ctx);
            if !workflow::is_transition_legal(change.kind, &current, &proposed)? {
                return Ok(Rejection::invalid_transition(&current, &proposed).into());
            }
        }
    }

    if change.kind == EntityKind::Relationship && touches_edge(change) {
        let empty = DependencyGraph::new();
        let graph = ctx.graph.unwrap_or(&empty);
        let source = merged_field(change, ctx, "source");
        let rel_type = merged_field(change, ctx, "type");
        let target = merged_field(change, ctx, "target");

        let verdict = graph.check_edge(
            source.as_deref(),
            rel_type.as_deref(),
            target.as_deref(),
            change.existing_id.as_deref(),
        );
        if !verdict.is_accepted() {
            return Ok(verdict);
        }
    }

    Ok(Verdict::Accepted)
}

/// True when the mutation can alter the shape of the graph
///
/// Updates that touch neither endpoint nor type cannot change the graph,
/// so the guard is skipped for them.
fn touches_edge(change: &ProposedChange) -> bool {
    change.is_create()
        || change.touches("source")
        || change.touches("type")
        || change.touches("target")
}

/// The status the record holds right now
///
/// Creations and snapshot-less updates fall back to the kind's initial
/// state, so an explicit status in a creation delta is validated as a
/// transition out of the initial state.
fn current_status(change: &ProposedChange, ctx: &ValidationContext) -> String {
    ctx.current
        .and_then(|current| current.get("status"))
        .map(|value| value.to_text())
        .or_else(|| workflow::initial_status(change.kind).map(str::to_string))
        .unwrap_or_default()
}

/// Delta value for the field, falling back to the stored snapshot
fn merged_field(change: &ProposedChange, ctx: &ValidationContext, field: &str) -> Option<String> {
    change
        .deltas
        .get(field)
        .or_else(|| ctx.current.and_then(|current| current.get(field)))
        .map(|value| value.to_text())
}
