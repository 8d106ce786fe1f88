//! Clash rule line parser.
//!
//! ```text
//! TYPE,payload,action[,param]
//! AND,((TYPE,payload),(TYPE,payload)),action
//! MATCH,action
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::RulesError;
use crate::rule::{
    Action, Condition, ConditionRule, LogicRule, LogicType, MatchRule, Rule, RuleType,
};

/// `LOGIC,(conditions),action`. The conditions group keeps its outer
/// parentheses so both `AND,((A,a),(B,b)),X` and `AND,(A,a),(B,b),X` scan
/// the same way.
static LOGIC_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?i:AND|OR|NOT))\s*,\s*(\(.*\))\s*,\s*([^,]+)$").expect("valid logic rule regex")
});

/// A flat `(TYPE,payload)` term.
static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*([^,()]+?)\s*,\s*([^()]+?)\s*\)").expect("valid condition regex")
});

static NESTED_LOGIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*(?i:AND|OR|NOT)\s*,").expect("valid nested logic regex")
});

/// Parse a single rule line.
///
/// Leading and trailing whitespace is ignored; the trimmed line is kept as
/// the rule's raw text.
pub fn parse_line(line: &str) -> Result<Rule, RulesError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(RulesError::InvalidRuleFormat("empty rule".into()));
    }

    let keyword = line.split(',').next().unwrap_or("");
    match RuleType::from_keyword(keyword) {
        Some(rule_type) if rule_type.is_logic() => parse_logic(line),
        Some(RuleType::Match) => parse_match(line),
        _ => parse_condition(line),
    }
}

fn parse_condition(line: &str) -> Result<Rule, RulesError> {
    let fields = split_fields(line);
    if !(3..=4).contains(&fields.len()) {
        return Err(RulesError::InvalidRuleFormat(format!(
            "expected TYPE,payload,action[,param]: {line}"
        )));
    }

    let (type_field, payload, action) = (fields[0], fields[1], fields[2]);
    if type_field.is_empty() || payload.is_empty() {
        return Err(RulesError::InvalidRuleFormat(format!(
            "empty rule type or payload: {line}"
        )));
    }
    if action.is_empty() {
        return Err(RulesError::InvalidRuleFormat(format!("empty action: {line}")));
    }

    let rule_type = RuleType::from_keyword(type_field)
        .ok_or_else(|| RulesError::UnknownRuleType(type_field.to_string()))?;
    if !rule_type.is_condition() {
        return Err(RulesError::InvalidRuleFormat(format!(
            "{rule_type} cannot be used as a plain rule: {line}"
        )));
    }

    let additional_params = fields
        .get(3)
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string());

    Ok(Rule::Condition(ConditionRule::new(
        rule_type,
        payload.to_string(),
        Action::parse(action),
        additional_params,
        line.to_string(),
    )))
}

fn parse_logic(line: &str) -> Result<Rule, RulesError> {
    let caps = LOGIC_RULE
        .captures(line)
        .ok_or_else(|| RulesError::MalformedLogicRule(line.to_string()))?;

    let logic_type = RuleType::from_keyword(&caps[1])
        .and_then(LogicType::from_rule_type)
        .ok_or_else(|| RulesError::MalformedLogicRule(line.to_string()))?;
    let body = &caps[2];
    let action = caps[3].trim();

    if NESTED_LOGIC.is_match(body) {
        return Err(RulesError::MalformedLogicRule(format!(
            "nested logic rules are not supported: {line}"
        )));
    }
    if action.is_empty() {
        return Err(RulesError::MalformedLogicRule(format!("empty action: {line}")));
    }

    let conditions = parse_conditions(body, line);
    if conditions.is_empty() {
        return Err(RulesError::MalformedLogicRule(format!(
            "no valid conditions: {line}"
        )));
    }

    Ok(Rule::Logic(LogicRule::new(
        logic_type,
        conditions,
        Action::parse(action),
        line.to_string(),
    )))
}

/// Scan every `(TYPE,payload)` term. Terms with an unknown or non-plain
/// type are dropped.
fn parse_conditions(body: &str, line: &str) -> Vec<Condition> {
    let mut conditions = Vec::new();
    for caps in CONDITION.captures_iter(body) {
        let type_field = &caps[1];
        match RuleType::from_keyword(type_field) {
            Some(rule_type) if rule_type.is_condition() => {
                conditions.push(Condition::new(rule_type, &caps[2]));
            }
            _ => {
                warn!(
                    condition_type = %type_field,
                    rule = %line,
                    "dropping logic condition with unsupported type"
                );
            }
        }
    }
    conditions
}

fn parse_match(line: &str) -> Result<Rule, RulesError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 2 || fields[1].is_empty() {
        return Err(RulesError::InvalidRuleFormat(format!(
            "expected MATCH,action: {line}"
        )));
    }
    Ok(Rule::Match(MatchRule::new(
        Action::parse(fields[1]),
        line.to_string(),
    )))
}

/// Split into trimmed fields.
///
/// Commas inside parentheses only stay in their field when the payload
/// opens with `(` and every parenthesis on the line is balanced, as in
/// `SUB-RULE,(NETWORK,tcp),name`. Anything else splits on every comma.
fn split_fields(line: &str) -> Vec<&str> {
    let grouped_payload = line
        .split_once(',')
        .is_some_and(|(_, rest)| rest.trim_start().starts_with('('));
    if grouped_payload && parens_balanced(line) {
        split_outside_parens(line)
    } else {
        line.split(',').map(str::trim).collect()
    }
}

fn parens_balanced(line: &str) -> bool {
    let mut depth = 0usize;
    for ch in line.chars() {
        match ch {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

fn split_outside_parens(line: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in line.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                fields.push(line[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(line[start..].trim());
    fields
}
