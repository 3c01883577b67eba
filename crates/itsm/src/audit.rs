//! Required-field audits.
//!
//! Creation is strict: every required field must be present and non-blank.
//! Updates are lenient: only fields actually present in the delta are
//! re-checked, so a partial update never trips over fields it does not
//! touch. Violations are reported one at a time, in declaration order.

use crate::domain::{EntityKind, FieldMap, Rejection};

/// Required fields per entity kind, in check order
///
/// Relationships have no entry here: endpoint completeness belongs to the
/// graph guard, which reports all three fields in a single message.
pub fn required_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Issue => &["title"],
        EntityKind::Change => &["title"],
        EntityKind::ConfigItem => &["name", "type", "status"],
        EntityKind::Relationship => &[],
    }
}

/// Audit a proposed delta for required-field violations
///
/// Returns the first violation found, or `None` when the delta is clean.
pub fn check_required_fields(
    kind: EntityKind,
    is_create: bool,
    deltas: &FieldMap,
) -> Option<Rejection> {
    for field in required_fields(kind) {
        match deltas.get(*field) {
            Some(value) if value.is_blank() => return Some(Rejection::missing_field(field)),
            Some(_) => {}
            None if is_create => return Some(Rejection::missing_field(field)),
            None => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RejectReason;

    fn delta(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), (*v).into()))
            .collect()
    }

    #[test]
    fn test_issue_create_without_title_is_rejected() {
        let rejection =
            check_required_fields(EntityKind::Issue, true, &FieldMap::new()).unwrap();
        assert_eq!(rejection.reason, RejectReason::MissingRequiredField);
        assert_eq!(rejection.message, "Title is required");
    }

    #[test]
    fn test_blank_title_counts_as_missing() {
        let rejection =
            check_required_fields(EntityKind::Issue, true, &delta(&[("title", "   ")])).unwrap();
        assert_eq!(rejection.message, "Title is required");
    }

    #[test]
    fn test_issue_create_with_title_passes() {
        let result = check_required_fields(EntityKind::Issue, true, &delta(&[("title", "x")]));
        assert_eq!(result, None);
    }

    #[test]
    fn test_update_not_touching_required_field_passes() {
        // An update that only moves the assignee must not demand a title
        let result = check_required_fields(
            EntityKind::Issue,
            false,
            &delta(&[("assigned_to", "alice")]),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_update_blanking_required_field_is_rejected() {
        let rejection =
            check_required_fields(EntityKind::Issue, false, &delta(&[("title", "")])).unwrap();
        assert_eq!(rejection.message, "Title is required");
    }

    #[test]
    fn test_ci_violations_surface_in_declaration_order() {
        let rejection =
            check_required_fields(EntityKind::ConfigItem, true, &FieldMap::new()).unwrap();
        assert_eq!(rejection.message, "Name is required");

        let rejection =
            check_required_fields(EntityKind::ConfigItem, true, &delta(&[("name", "web-01")]))
                .unwrap();
        assert_eq!(rejection.message, "Type is required");

        let rejection = check_required_fields(
            EntityKind::ConfigItem,
            true,
            &delta(&[("name", "web-01"), ("type", "server")]),
        )
        .unwrap();
        assert_eq!(rejection.message, "Status is required");
    }

    #[test]
    fn test_complete_ci_create_passes() {
        let result = check_required_fields(
            EntityKind::ConfigItem,
            true,
            &delta(&[("name", "web-01"), ("type", "server"), ("status", "active")]),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_ci_location_only_update_passes() {
        let result = check_required_fields(
            EntityKind::ConfigItem,
            false,
            &delta(&[("location", "rack 4")]),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_relationships_have_no_required_fields_here() {
        let result = check_required_fields(EntityKind::Relationship, true, &FieldMap::new());
        assert_eq!(result, None);
    }

    #[test]
    fn test_change_create_requires_title() {
        let rejection =
            check_required_fields(EntityKind::Change, true, &delta(&[("priority", "high")]))
                .unwrap();
        assert_eq!(rejection.message, "Title is required");
    }
}
