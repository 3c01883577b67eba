//! Inbound mail ingestion
//!
//! A mail reply is a workflow command only when its subject carries a status
//! directive. Directives go through the same update path as every other
//! adapter; strictness only decides whether a rejected directive bounces
//! back to the sender or is quietly dropped.

use super::*;
use crate::domain::Rejection;
use crate::mailgate::{self, MailStrictness};
use crate::workflow::IssueStatus;
use serde::Serialize;

/// What happened to one ingested mail
#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MailOutcome {
    /// Subject carried no status directive; the mail is plain correspondence
    NoDirective,
    /// The directive token is not a workflow state; the directive is dropped
    UnknownStatus { token: String },
    /// The directive names the status the issue already holds
    Unchanged,
    /// The directive was validated and applied
    Applied { status: String },
    /// The engine rejected the transition
    Rejected { rejection: Rejection, bounced: bool },
}

impl<S: EntityStore> CommandExecutor<S> {
    /// Ingest one mail reply against an issue
    ///
    /// Returns an error only for infrastructure problems (unknown issue,
    /// storage failure, workflow drift). Everything the mail itself can get
    /// wrong is reported as an outcome, because a misbehaving sender must
    /// not look like a broken gateway.
    pub fn ingest_mail(
        &self,
        issue_id: &str,
        subject: &str,
        strictness: MailStrictness,
    ) -> Result<MailOutcome> {
        let token = match mailgate::parse_status_directive(subject) {
            Some(token) => token,
            None => return Ok(MailOutcome::NoDirective),
        };

        // Tokens outside the issue workflow never reach the engine
        if token.parse::<IssueStatus>().is_err() {
            return Ok(MailOutcome::UnknownStatus { token });
        }

        let full_id = self.storage.resolve_id(EntityKind::Issue, issue_id)?;
        let issue = self.storage.load_issue(&full_id)?;
        if issue.status == token {
            return Ok(MailOutcome::Unchanged);
        }

        let mut deltas = FieldMap::new();
        deltas.insert("status".to_string(), token.as_str().into());

        match self.update_issue(&full_id, deltas) {
            Ok(_) => Ok(MailOutcome::Applied { status: token }),
            Err(err) => match err.downcast::<Rejection>() {
                Ok(rejection) => Ok(MailOutcome::Rejected {
                    rejection,
                    bounced: strictness == MailStrictness::Bounce,
                }),
                Err(err) => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RejectReason;
    use crate::storage::InMemoryStorage;

    fn executor_with_issue() -> (CommandExecutor<InMemoryStorage>, String) {
        let storage = InMemoryStorage::new();
        storage.init().unwrap();
        let executor = CommandExecutor::new(storage);

        let mut deltas = FieldMap::new();
        deltas.insert("title".to_string(), "Mail server down".into());
        let id = executor.create_issue(deltas).unwrap();
        (executor, id)
    }

    #[test]
    fn test_mail_without_directive_is_ignored() {
        let (executor, id) = executor_with_issue();

        let outcome = executor
            .ingest_mail(&id, "Re: Mail server down", MailStrictness::Drop)
            .unwrap();
        assert_eq!(outcome, MailOutcome::NoDirective);
        assert_eq!(executor.show_issue(&id).unwrap().status, "new");
    }

    #[test]
    fn test_mail_with_unknown_token_is_dropped_before_validation() {
        let (executor, id) = executor_with_issue();

        let outcome = executor
            .ingest_mail(&id, "Re: down [status=wontfix]", MailStrictness::Bounce)
            .unwrap();
        assert_eq!(
            outcome,
            MailOutcome::UnknownStatus {
                token: "wontfix".to_string()
            }
        );
    }

    #[test]
    fn test_mail_applies_a_legal_transition() {
        let (executor, id) = executor_with_issue();

        let outcome = executor
            .ingest_mail(&id, "Re: down [status=in-progress]", MailStrictness::Drop)
            .unwrap();
        assert_eq!(
            outcome,
            MailOutcome::Applied {
                status: "in-progress".to_string()
            }
        );
        assert_eq!(executor.show_issue(&id).unwrap().status, "in-progress");
    }

    #[test]
    fn test_mail_restating_the_current_status_is_a_noop() {
        let (executor, id) = executor_with_issue();

        let outcome = executor
            .ingest_mail(&id, "Re: down [status=new]", MailStrictness::Drop)
            .unwrap();
        assert_eq!(outcome, MailOutcome::Unchanged);

        // No update event was logged for the no-op
        let events = executor.storage().read_events().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].get_type(), "entity_created");
    }

    #[test]
    fn test_mail_rejection_is_dropped_under_default_strictness() {
        let (executor, id) = executor_with_issue();

        let outcome = executor
            .ingest_mail(&id, "Re: down [status=closed]", MailStrictness::Drop)
            .unwrap();
        match outcome {
            MailOutcome::Rejected { rejection, bounced } => {
                assert_eq!(rejection.reason, RejectReason::InvalidWorkflowTransition);
                assert_eq!(rejection.message, "Invalid status transition: new -> closed");
                assert!(!bounced);
            }
            other => panic!("expected a rejection, got {:?}", other),
        }

        assert_eq!(executor.show_issue(&id).unwrap().status, "new");
    }

    #[test]
    fn test_mail_rejection_bounces_under_bounce_strictness() {
        let (executor, id) = executor_with_issue();

        let outcome = executor
            .ingest_mail(&id, "Re: down [status=closed]", MailStrictness::Bounce)
            .unwrap();
        match outcome {
            MailOutcome::Rejected { bounced, .. } => assert!(bounced),
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_mail_against_unknown_issue_is_an_error() {
        let (executor, _) = executor_with_issue();

        let err = executor
            .ingest_mail("deadbeef", "[status=in-progress]", MailStrictness::Drop)
            .unwrap_err();
        assert!(err.to_string().contains("Issue not found"));
    }

    #[test]
    fn test_mail_outcome_serialization() {
        let outcome = MailOutcome::Applied {
            status: "resolved".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "applied");
        assert_eq!(json["status"], "resolved");

        let json = serde_json::to_value(&MailOutcome::NoDirective).unwrap();
        assert_eq!(json["outcome"], "no_directive");
    }
}
