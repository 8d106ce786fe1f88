//! Parsers for rule lines and structured records.

pub mod line;
pub mod record;

use tracing::warn;

pub use line::parse_line;
pub use record::parse_record;

use crate::error::RulesError;
use crate::record::RuleRecord;
use crate::rule::Rule;

/// Anything that can be parsed into a single [`Rule`].
pub trait RuleInput {
    fn parse_rule(&self) -> Result<Rule, RulesError>;

    /// Identifies this input in a [`ParseFailure`].
    fn describe(&self) -> String;

    /// Inputs that carry no rule at all (blank lines, comments) are
    /// skipped by batch parsing without being reported.
    fn is_blank(&self) -> bool {
        false
    }
}

impl RuleInput for str {
    fn parse_rule(&self) -> Result<Rule, RulesError> {
        parse_line(self)
    }

    fn describe(&self) -> String {
        self.trim().to_string()
    }

    fn is_blank(&self) -> bool {
        let line = self.trim();
        line.is_empty() || line.starts_with('#')
    }
}

impl RuleInput for String {
    fn parse_rule(&self) -> Result<Rule, RulesError> {
        self.as_str().parse_rule()
    }

    fn describe(&self) -> String {
        self.as_str().describe()
    }

    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl RuleInput for RuleRecord {
    fn parse_rule(&self) -> Result<Rule, RulesError> {
        parse_record(self)
    }

    fn describe(&self) -> String {
        record::record_to_line(self)
    }
}

impl<T: RuleInput + ?Sized> RuleInput for &T {
    fn parse_rule(&self) -> Result<Rule, RulesError> {
        (**self).parse_rule()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn is_blank(&self) -> bool {
        (**self).is_blank()
    }
}

/// One input that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub input: String,
    pub error: RulesError,
}

/// Result of a batch parse: the rules that parsed, in input order, and
/// every input that did not.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub rules: Vec<Rule>,
    pub failures: Vec<ParseFailure>,
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse every input independently.
///
/// Failures are collected rather than aborting the batch. Parsed rules
/// keep their relative order and are numbered `0..n` in that order.
pub fn parse_many<I>(inputs: I) -> ParseOutcome
where
    I: IntoIterator,
    I::Item: RuleInput,
{
    let mut outcome = ParseOutcome::default();
    for input in inputs {
        if input.is_blank() {
            continue;
        }
        match input.parse_rule() {
            Ok(mut rule) => {
                rule.set_priority(outcome.rules.len());
                outcome.rules.push(rule);
            }
            Err(error) => {
                let input = input.describe();
                warn!(rule = %input, error = %error, "skipping unparseable rule");
                outcome.failures.push(ParseFailure { input, error });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleType;

    #[test]
    fn parse_many_keeps_order_and_reports_failures() {
        let outcome = parse_many(["DOMAIN,x.com,DIRECT", "GARBAGE", "MATCH,DIRECT"]);
        assert_eq!(outcome.rules.len(), 2);
        assert_eq!(outcome.rules[0].raw_text(), "DOMAIN,x.com,DIRECT");
        assert_eq!(outcome.rules[1].raw_text(), "MATCH,DIRECT");
        assert_eq!(outcome.rules[0].priority(), 0);
        assert_eq!(outcome.rules[1].priority(), 1);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].input, "GARBAGE");
        assert!(matches!(
            outcome.failures[0].error,
            RulesError::InvalidRuleFormat(_)
        ));
        assert!(!outcome.is_clean());
    }

    #[test]
    fn parse_many_skips_blank_and_comment_lines() {
        let content = "\n# proxies\nDOMAIN-SUFFIX,google.com,Proxy\n\n  # trailing\nMATCH,DIRECT\n";
        let outcome = parse_many(content.lines());
        assert!(outcome.is_clean());
        assert_eq!(outcome.rules.len(), 2);
        assert_eq!(outcome.rules[0].rule_type(), RuleType::DomainSuffix);
    }

    #[test]
    fn parse_many_accepts_owned_and_borrowed_inputs() {
        let owned = vec!["DOMAIN,a.com,DIRECT".to_string(), "FOO,b,DIRECT".to_string()];
        let outcome = parse_many(&owned);
        assert_eq!(outcome.rules.len(), 1);
        assert_eq!(
            outcome.failures[0].error,
            RulesError::UnknownRuleType("FOO".into())
        );

        let outcome = parse_many(owned);
        assert_eq!(outcome.rules.len(), 1);
    }

    #[test]
    fn parse_many_records() {
        let records = vec![
            RuleRecord {
                rule_type: "DOMAIN".into(),
                payload: Some("a.com".into()),
                action: "DIRECT".into(),
                priority: Some(9),
                ..Default::default()
            },
            RuleRecord {
                rule_type: "NOPE".into(),
                action: "DIRECT".into(),
                ..Default::default()
            },
            RuleRecord {
                rule_type: "MATCH".into(),
                action: "Proxy".into(),
                ..Default::default()
            },
        ];
        let outcome = parse_many(&records);
        assert_eq!(outcome.rules.len(), 2);
        // batch position wins over the record's own priority
        assert_eq!(outcome.rules[0].priority(), 0);
        assert_eq!(outcome.rules[1].priority(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].input, "NOPE,,DIRECT");
    }
}
