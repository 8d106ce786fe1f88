//! Structured record parser.
//!
//! A record is rendered back into its rule line and handed to
//! [`parse_line`], so records and text share one set of validation rules.

use crate::error::RulesError;
use crate::parser::line::parse_line;
use crate::record::RuleRecord;
use crate::rule::{Rule, RuleType};

/// Parse a structured record. An explicit `priority` on the record is
/// carried over to the parsed rule.
///
/// Fields whose separators would change how the rebuilt line splits (a `,`
/// in the action, a parenthesis in a logic condition, a payload that does
/// not come back intact) are `InvalidRuleFormat`.
pub fn parse_record(record: &RuleRecord) -> Result<Rule, RulesError> {
    check_separators(record)?;
    let line = record_to_line(record);
    let mut rule = parse_line(&line)?;
    if let Rule::Condition(cond) = &rule {
        let payload = record.payload.as_deref().unwrap_or("").trim();
        if cond.payload() != payload {
            return Err(RulesError::InvalidRuleFormat(format!(
                "payload {payload:?} does not fit in a single rule field"
            )));
        }
    }
    if let Some(priority) = record.priority {
        rule.set_priority(priority);
    }
    Ok(rule)
}

fn check_separators(record: &RuleRecord) -> Result<(), RulesError> {
    if record.action.contains(',') {
        return Err(RulesError::InvalidRuleFormat(format!(
            "action contains ',': {}",
            record.action
        )));
    }
    if let Some(params) = &record.additional_params
        && params.contains(',')
    {
        return Err(RulesError::InvalidRuleFormat(format!(
            "additional_params contains ',': {params}"
        )));
    }
    for condition in &record.conditions {
        if condition.rule_type.contains([',', '(', ')'])
            || condition.payload.contains(['(', ')'])
        {
            return Err(RulesError::InvalidRuleFormat(format!(
                "condition ({},{}) contains a separator",
                condition.rule_type, condition.payload
            )));
        }
    }
    Ok(())
}

/// Rebuild the textual rule line a record describes.
pub(crate) fn record_to_line(record: &RuleRecord) -> String {
    let rule_type = record.rule_type.trim();
    let action = record.action.trim();
    match RuleType::from_keyword(rule_type) {
        Some(t) if t.is_logic() => {
            let conditions: Vec<String> = record
                .conditions
                .iter()
                .map(|c| format!("({},{})", c.rule_type.trim(), c.payload.trim()))
                .collect();
            format!("{rule_type},({}),{action}", conditions.join(","))
        }
        Some(RuleType::Match) => format!("{rule_type},{action}"),
        _ => {
            let payload = record.payload.as_deref().unwrap_or("").trim();
            match record.additional_params.as_deref() {
                Some(params) => format!("{rule_type},{payload},{action},{}", params.trim()),
                None => format!("{rule_type},{payload},{action}"),
            }
        }
    }
}
