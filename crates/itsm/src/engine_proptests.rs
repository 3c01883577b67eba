//! Property-based tests for validation engine invariants
//!
//! These tests use `proptest` to verify engine invariants across randomly
//! generated proposals and graphs, catching edge cases that example-based
//! tests might miss.

use proptest::prelude::*;

use crate::domain::{EntityKind, FieldMap, ProposedChange, RejectReason, Verdict};
use crate::engine::{validate, ValidationContext};
use crate::graph::{DependencyGraph, Edge};

fn reason(verdict: &Verdict) -> Option<RejectReason> {
    verdict.rejection().map(|r| r.reason)
}

fn snapshot(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), (*v).into()))
        .collect()
}

// Generator for arbitrary status-like tokens, valid or not
fn status_token_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z\\-]{0,10}"
}

// Generator for status tokens outside the issue workflow vocabulary
fn unknown_issue_status_strategy() -> impl Strategy<Value = String> {
    "[a-z]{3,10}".prop_filter("token must not be a real issue status", |token| {
        !matches!(token.as_str(), "new" | "in-progress" | "resolved" | "closed")
    })
}

// Generator for relationship type tokens
fn rel_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("runs-on".to_string()),
        Just("hosts".to_string()),
        Just("depends-on".to_string()),
        Just("required-by".to_string()),
        Just("connects-to".to_string()),
        Just("contains".to_string()),
    ]
}

// Generator for a dependency chain ci-0 -> ci-1 -> ... -> ci-n
fn chain_graph(length: usize) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for i in 0..length {
        graph.insert(Edge::new(
            format!("rel-{}", i),
            format!("ci-{}", i),
            "depends-on",
            format!("ci-{}", i + 1),
        ));
    }
    graph
}

// Property 1: an update that changes nothing is always accepted
// The snapshot may hold any status, including tokens the workflow tables
// no longer know; with no deltas there is nothing to refuse.
proptest! {
    #[test]
    fn prop_empty_update_always_accepted(
        stored_status in status_token_strategy(),
        stored_title in "[a-zA-Z0-9 ]{0,24}"
    ) {
        let current = snapshot(&[("status", &stored_status), ("title", &stored_title)]);
        let change = ProposedChange::update(EntityKind::Issue, "some-id", FieldMap::new());

        let verdict = validate(&change, &ValidationContext::new().with_current(&current)).unwrap();
        prop_assert_eq!(verdict, Verdict::Accepted);
    }
}

// Property 2: restating the stored status is always accepted
// The no-op rule is decided before any token parsing, so even a record
// stuck in an unknown state can be saved without touching its status.
proptest! {
    #[test]
    fn prop_restating_stored_status_accepted(
        stored_status in status_token_strategy()
    ) {
        let current = snapshot(&[("status", &stored_status), ("title", "Stuck record")]);
        let change = ProposedChange::update(
            EntityKind::Issue,
            "some-id",
            snapshot(&[("status", &stored_status)]),
        );

        let verdict = validate(&change, &ValidationContext::new().with_current(&current)).unwrap();
        prop_assert_eq!(verdict, Verdict::Accepted);
    }
}

// Property 3: an unknown proposed status is a rejection, never drift
// Drift is reserved for bad stored state; bad input from outside stays a
// verdict no matter what token the caller invents.
proptest! {
    #[test]
    fn prop_unknown_proposed_status_is_rejected(
        proposed in unknown_issue_status_strategy()
    ) {
        let change = ProposedChange::create(
            EntityKind::Issue,
            snapshot(&[("title", "Disk full"), ("status", &proposed)]),
        );

        let verdict = validate(&change, &ValidationContext::new()).unwrap();
        prop_assert_eq!(reason(&verdict), Some(RejectReason::InvalidWorkflowTransition));

        let rejection = verdict.rejection().unwrap();
        prop_assert!(
            rejection.message.contains(&proposed),
            "message should name the bad token: {}",
            rejection.message
        );
    }
}

// Property 4: a creation without a usable title is rejected
// Whatever else the delta carries, a missing or whitespace-only title
// fails the audit first.
proptest! {
    #[test]
    fn prop_create_without_title_rejected(
        blank_title in proptest::option::of("[ \t]{0,5}"),
        assigned_to in "[a-z]{1,8}"
    ) {
        let mut deltas = FieldMap::new();
        if let Some(blank) = blank_title {
            deltas.insert("title".to_string(), blank.into());
        }
        deltas.insert("assigned_to".to_string(), assigned_to.into());

        let change = ProposedChange::create(EntityKind::Issue, deltas);
        let verdict = validate(&change, &ValidationContext::new()).unwrap();

        prop_assert_eq!(reason(&verdict), Some(RejectReason::MissingRequiredField));
        prop_assert_eq!(
            &verdict.rejection().unwrap().message,
            "Title is required"
        );
    }
}

// Property 5: any edge pointing back along a dependency chain is rejected
// Cycle detection follows reachability over all edges, so the closing
// edge is refused regardless of its relationship type.
proptest! {
    #[test]
    fn prop_chain_closing_edge_rejected(
        length in 2usize..8,
        offsets in (1usize..100, 1usize..100),
        rel_type in rel_type_strategy()
    ) {
        let graph = chain_graph(length);

        // Pick back_to < from within the chain
        let from = 1 + offsets.0 % length;
        let back_to = offsets.1 % from;

        let change = ProposedChange::create(
            EntityKind::Relationship,
            snapshot(&[
                ("source", &format!("ci-{}", from)),
                ("type", &rel_type),
                ("target", &format!("ci-{}", back_to)),
            ]),
        );

        let verdict = validate(&change, &ValidationContext::new().with_graph(&graph)).unwrap();
        prop_assert_eq!(
            reason(&verdict),
            Some(RejectReason::CircularDependency),
            "ci-{} -> ci-{} should close a cycle over a {}-long chain",
            from,
            back_to,
            length
        );
    }
}

// Property 6: resubmitting any stored triple is rejected as a duplicate
proptest! {
    #[test]
    fn prop_duplicate_triple_rejected(
        length in 1usize..8,
        pick in any::<prop::sample::Index>()
    ) {
        let graph = chain_graph(length);
        let existing = &graph.edges()[pick.index(length)];

        let change = ProposedChange::create(
            EntityKind::Relationship,
            snapshot(&[
                ("source", &existing.source),
                ("type", &existing.rel_type),
                ("target", &existing.target),
            ]),
        );

        let verdict = validate(&change, &ValidationContext::new().with_graph(&graph)).unwrap();
        prop_assert_eq!(reason(&verdict), Some(RejectReason::DuplicateEdge));
    }
}

// Property 7: an edge between CIs the graph has never seen is accepted
proptest! {
    #[test]
    fn prop_fresh_edge_always_accepted(
        length in 0usize..8,
        suffix in "[a-z]{4,8}",
        rel_type in rel_type_strategy()
    ) {
        let graph = chain_graph(length);

        let change = ProposedChange::create(
            EntityKind::Relationship,
            snapshot(&[
                ("source", &format!("fresh-{}-a", suffix)),
                ("type", &rel_type),
                ("target", &format!("fresh-{}-b", suffix)),
            ]),
        );

        let verdict = validate(&change, &ValidationContext::new().with_graph(&graph)).unwrap();
        prop_assert_eq!(verdict, Verdict::Accepted);
    }
}
