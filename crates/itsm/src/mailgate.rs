//! Mail gateway directive parsing.
//!
//! The mail adapter lets a reply drive an issue's workflow: a subject line
//! may carry a status directive such as `[status=in-progress]` or
//! `[status:resolved]`. This module only extracts the directive. Applying
//! it goes through the same validation path as every other adapter, and
//! [`MailStrictness`] decides what the gateway does when that validation
//! rejects the mutation.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Regex for a subject status directive: `[status=token]` or `[status:token]`
///
/// Matching is case-insensitive; tokens are lowercase words with hyphens.
static DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();

fn directive_regex() -> &'static Regex {
    DIRECTIVE_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\[status[=:]([a-z][a-z\-]*)\]").expect("Directive regex should compile")
    })
}

/// Extract the status directive from a mail subject, if present
///
/// The returned token is lowercased. A subject without a directive is
/// simply not a workflow command; `None` is not an error.
///
/// # Examples
///
/// ```
/// use itsm::mailgate::parse_status_directive;
///
/// assert_eq!(
///     parse_status_directive("Re: web outage [status=in-progress]"),
///     Some("in-progress".to_string())
/// );
/// assert_eq!(parse_status_directive("Re: web outage"), None);
/// ```
pub fn parse_status_directive(subject: &str) -> Option<String> {
    directive_regex()
        .captures(subject)
        .map(|captures| captures[1].to_lowercase())
}

/// What the gateway does with a mail whose directive is rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailStrictness {
    /// Discard the directive, keep the mail
    #[default]
    Drop,
    /// Bounce the mail back to the sender
    Bounce,
}

impl MailStrictness {
    /// Parse a strictness token from configuration
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "drop" => Some(MailStrictness::Drop),
            "bounce" => Some(MailStrictness::Bounce),
            _ => None,
        }
    }
}
