//! Structured (dict) form of a rule, for programmatic construction and
//! persistence by callers.

use serde::{Deserialize, Serialize};

use crate::rule::Rule;

/// One condition of a logic rule in structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRecord {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub payload: String,
}

/// A rule in structured form.
///
/// Field presence depends on the variant:
/// - condition: `type`, `payload`, `action`, `additional_params?`, `priority`
/// - logic: `type` (AND/OR/NOT), `conditions`, `action`, `priority`
/// - match: `type` (MATCH), `action`, `priority`
///
/// Fields are plain strings so that invalid input reaches the parser and
/// is reported as a [`RulesError`](crate::RulesError) rather than a serde
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionRecord>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_params: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<usize>,
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        let mut record = RuleRecord {
            rule_type: rule.rule_type().as_str().to_string(),
            action: rule.action().to_string(),
            priority: Some(rule.priority()),
            ..Default::default()
        };
        match rule {
            Rule::Condition(r) => {
                record.payload = Some(r.payload().to_string());
                record.additional_params = r.additional_params().map(str::to_string);
            }
            Rule::Logic(r) => {
                record.conditions = r
                    .conditions()
                    .iter()
                    .map(|c| ConditionRecord {
                        rule_type: c.rule_type.as_str().to_string(),
                        payload: c.payload.clone(),
                    })
                    .collect();
            }
            Rule::Match(_) => {}
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn condition_record_shape() {
        let rule: Rule = "IP-CIDR,10.0.0.0/8,DIRECT,no-resolve".parse().unwrap();
        let value = serde_json::to_value(RuleRecord::from(&rule)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "IP-CIDR",
                "payload": "10.0.0.0/8",
                "action": "DIRECT",
                "additional_params": "no-resolve",
                "priority": 0,
            })
        );
    }

    #[test]
    fn logic_record_shape() {
        let rule: Rule = "AND,((DOMAIN,x.com),(NETWORK,UDP)),Proxy".parse().unwrap();
        let value = serde_json::to_value(RuleRecord::from(&rule)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "AND",
                "conditions": [
                    {"type": "DOMAIN", "payload": "x.com"},
                    {"type": "NETWORK", "payload": "UDP"},
                ],
                "action": "Proxy",
                "priority": 0,
            })
        );
    }

    #[test]
    fn match_record_shape() {
        let rule: Rule = "MATCH,REJECT".parse().unwrap();
        let value = serde_json::to_value(RuleRecord::from(&rule)).unwrap();
        assert_eq!(value, json!({"type": "MATCH", "action": "REJECT", "priority": 0}));
    }

    #[test]
    fn deserialize_minimal_record() {
        let record: RuleRecord =
            serde_json::from_value(json!({"type": "MATCH", "action": "DIRECT"})).unwrap();
        assert_eq!(record.rule_type, "MATCH");
        assert!(record.payload.is_none());
        assert!(record.conditions.is_empty());
        assert!(record.priority.is_none());
    }
}
