//! Error types for the rule parser and store.

use thiserror::Error;

/// Errors that can occur while parsing rules or editing a rule store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RulesError {
    /// Wrong field count, or an empty required field.
    #[error("invalid rule format: {0}")]
    InvalidRuleFormat(String),

    #[error("unknown rule type: {0}")]
    UnknownRuleType(String),

    /// A logic rule that does not have the `TYPE,(conditions),action` shape.
    #[error("malformed logic rule: {0}")]
    MalformedLogicRule(String),

    #[error("no rule at priority {0}")]
    NotFound(usize),

    #[error("duplicate rule: {0}")]
    DuplicateRule(String),
}
