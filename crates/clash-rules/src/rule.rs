//! Rule, condition and action type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RulesError;

macro_rules! rule_types {
    ($($variant:ident => $keyword:literal),* $(,)?) => {
        /// A Clash rule type keyword.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum RuleType {
            $(
                #[serde(rename = $keyword)]
                $variant,
            )*
        }

        impl RuleType {
            /// Every rule type, in keyword-table order.
            pub const ALL: &'static [RuleType] = &[$(RuleType::$variant),*];

            /// The Clash keyword, e.g. `DOMAIN-SUFFIX`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(RuleType::$variant => $keyword,)*
                }
            }

            /// Look up a rule type by keyword, ignoring ASCII case and
            /// surrounding whitespace.
            pub fn from_keyword(keyword: &str) -> Option<Self> {
                let upper = keyword.trim().to_ascii_uppercase();
                match upper.as_str() {
                    $($keyword => Some(RuleType::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

rule_types! {
    Domain => "DOMAIN",
    DomainSuffix => "DOMAIN-SUFFIX",
    DomainKeyword => "DOMAIN-KEYWORD",
    DomainRegex => "DOMAIN-REGEX",
    Geosite => "GEOSITE",
    IpCidr => "IP-CIDR",
    IpCidr6 => "IP-CIDR6",
    IpSuffix => "IP-SUFFIX",
    IpAsn => "IP-ASN",
    Geoip => "GEOIP",
    SrcGeoip => "SRC-GEOIP",
    SrcIpAsn => "SRC-IP-ASN",
    SrcIpCidr => "SRC-IP-CIDR",
    SrcIpSuffix => "SRC-IP-SUFFIX",
    DstPort => "DST-PORT",
    SrcPort => "SRC-PORT",
    InPort => "IN-PORT",
    InType => "IN-TYPE",
    InUser => "IN-USER",
    InName => "IN-NAME",
    ProcessPath => "PROCESS-PATH",
    ProcessPathRegex => "PROCESS-PATH-REGEX",
    ProcessName => "PROCESS-NAME",
    ProcessNameRegex => "PROCESS-NAME-REGEX",
    Uid => "UID",
    Network => "NETWORK",
    Dscp => "DSCP",
    RuleSet => "RULE-SET",
    And => "AND",
    Or => "OR",
    Not => "NOT",
    SubRule => "SUB-RULE",
    Match => "MATCH",
}

impl RuleType {
    /// True for AND, OR and NOT.
    pub fn is_logic(self) -> bool {
        matches!(self, RuleType::And | RuleType::Or | RuleType::Not)
    }

    /// True for types that carry a plain `payload` (everything except
    /// the logic combinators and MATCH).
    pub fn is_condition(self) -> bool {
        !self.is_logic() && self != RuleType::Match
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleType {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleType::from_keyword(s).ok_or_else(|| RulesError::UnknownRuleType(s.trim().to_string()))
    }
}

/// Logic combinator of a [`LogicRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicType {
    And,
    Or,
    Not,
}

impl LogicType {
    pub fn as_str(self) -> &'static str {
        self.rule_type().as_str()
    }

    pub fn rule_type(self) -> RuleType {
        match self {
            LogicType::And => RuleType::And,
            LogicType::Or => RuleType::Or,
            LogicType::Not => RuleType::Not,
        }
    }

    pub fn from_rule_type(rule_type: RuleType) -> Option<Self> {
        match rule_type {
            RuleType::And => Some(LogicType::And),
            RuleType::Or => Some(LogicType::Or),
            RuleType::Not => Some(LogicType::Not),
            _ => None,
        }
    }
}

/// Action to take when a rule matches.
///
/// Serializes as its Clash token: `DIRECT`, `REJECT-DROP`, or the proxy
/// group name verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    /// Connect directly to the target.
    Direct,
    /// Reject the connection.
    Reject,
    /// Reject the connection by silently dropping it.
    RejectDrop,
    /// Skip this rule and continue matching.
    Pass,
    Compatible,
    /// Route through a user-defined proxy group.
    Group(String),
}

impl Action {
    /// Resolve an action token.
    ///
    /// Built-in actions match case-insensitively. Anything else is kept
    /// verbatim (trimmed) as a proxy group name.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.to_ascii_uppercase().as_str() {
            "DIRECT" => Action::Direct,
            "REJECT" => Action::Reject,
            "REJECT-DROP" => Action::RejectDrop,
            "PASS" => Action::Pass,
            "COMPATIBLE" => Action::Compatible,
            _ => Action::Group(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::Direct => "DIRECT",
            Action::Reject => "REJECT",
            Action::RejectDrop => "REJECT-DROP",
            Action::Pass => "PASS",
            Action::Compatible => "COMPATIBLE",
            Action::Group(name) => name,
        }
    }

    /// True for the five built-in actions.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Action::Group(_))
    }

    /// The proxy group name, if this action targets one.
    pub fn as_group(&self) -> Option<&str> {
        match self {
            Action::Group(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Action {
    fn from(s: String) -> Self {
        Action::parse(&s)
    }
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        Action::parse(s)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Group(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

/// One `(TYPE,payload)` term inside a logic rule. Conditions never carry
/// their own action; only the enclosing [`LogicRule`] does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub rule_type: RuleType,
    pub payload: String,
}

impl Condition {
    pub fn new(rule_type: RuleType, payload: impl Into<String>) -> Self {
        Self {
            rule_type,
            payload: payload.into(),
        }
    }

    /// Render as `(TYPE,payload)`.
    pub fn render(&self) -> String {
        format!("({},{})", self.rule_type, self.payload)
    }
}

/// A plain `TYPE,payload,action[,param]` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionRule {
    rule_type: RuleType,
    payload: String,
    action: Action,
    additional_params: Option<String>,
    raw_text: String,
    priority: usize,
}

impl ConditionRule {
    pub(crate) fn new(
        rule_type: RuleType,
        payload: String,
        action: Action,
        additional_params: Option<String>,
        raw_text: String,
    ) -> Self {
        Self {
            rule_type,
            payload,
            action,
            additional_params,
            raw_text,
            priority: 0,
        }
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Trailing auxiliary token such as `no-resolve` or `src`.
    pub fn additional_params(&self) -> Option<&str> {
        self.additional_params.as_deref()
    }

    /// The text this rule was parsed from (or re-rendered after a setter).
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn priority(&self) -> usize {
        self.priority
    }

    /// Replace the payload. `raw_text` is re-rendered from the fields.
    ///
    /// Fails when the payload cannot be written back as a rule field
    /// (empty, surrounding whitespace, or a `,` that would split it).
    pub fn set_payload(&mut self, payload: impl Into<String>) -> Result<(), RulesError> {
        let mut edited = self.clone();
        edited.payload = payload.into();
        self.commit(edited)
    }

    /// Replace the action. `raw_text` is re-rendered from the fields.
    pub fn set_action(&mut self, action: Action) -> Result<(), RulesError> {
        let mut edited = self.clone();
        edited.action = action;
        self.commit(edited)
    }

    /// Replace the trailing parameter. `raw_text` is re-rendered.
    pub fn set_additional_params(&mut self, params: Option<String>) -> Result<(), RulesError> {
        let mut edited = self.clone();
        edited.additional_params = params;
        self.commit(edited)
    }

    fn commit(&mut self, mut edited: Self) -> Result<(), RulesError> {
        let line = checked_render(edited.render(), |parsed| {
            parsed.as_condition().is_some_and(|p| {
                p.rule_type == edited.rule_type
                    && p.payload == edited.payload
                    && p.action == edited.action
                    && p.additional_params == edited.additional_params
            })
        })?;
        edited.raw_text = line;
        *self = edited;
        Ok(())
    }

    /// Canonical line derived from the fields.
    pub fn render(&self) -> String {
        match &self.additional_params {
            Some(params) => format!(
                "{},{},{},{}",
                self.rule_type, self.payload, self.action, params
            ),
            None => format!("{},{},{}", self.rule_type, self.payload, self.action),
        }
    }
}

/// An `AND`/`OR`/`NOT` rule over a flat list of conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicRule {
    logic_type: LogicType,
    conditions: Vec<Condition>,
    action: Action,
    raw_text: String,
    priority: usize,
}

impl LogicRule {
    pub(crate) fn new(
        logic_type: LogicType,
        conditions: Vec<Condition>,
        action: Action,
        raw_text: String,
    ) -> Self {
        Self {
            logic_type,
            conditions,
            action,
            raw_text,
            priority: 0,
        }
    }

    pub fn logic_type(&self) -> LogicType {
        self.logic_type
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn set_action(&mut self, action: Action) -> Result<(), RulesError> {
        let mut edited = self.clone();
        edited.action = action;
        self.commit(edited)
    }

    /// Replace the conditions. An empty list is rejected since a logic
    /// rule without conditions cannot be parsed back.
    pub fn set_conditions(&mut self, conditions: Vec<Condition>) -> Result<(), RulesError> {
        if conditions.is_empty() {
            return Err(RulesError::MalformedLogicRule(
                "logic rule needs at least one condition".into(),
            ));
        }
        let mut edited = self.clone();
        edited.conditions = conditions;
        self.commit(edited)
    }

    fn commit(&mut self, mut edited: Self) -> Result<(), RulesError> {
        let line = checked_render(edited.render(), |parsed| {
            parsed.as_logic().is_some_and(|p| {
                p.logic_type == edited.logic_type
                    && p.conditions == edited.conditions
                    && p.action == edited.action
            })
        })?;
        edited.raw_text = line;
        *self = edited;
        Ok(())
    }

    /// Canonical line in Clash's double-paren form:
    /// `AND,((DOMAIN,a.com),(NETWORK,UDP)),DIRECT`.
    pub fn render(&self) -> String {
        let conditions: Vec<String> = self.conditions.iter().map(Condition::render).collect();
        format!(
            "{},({}),{}",
            self.logic_type.as_str(),
            conditions.join(","),
            self.action
        )
    }
}

/// The catch-all `MATCH,action` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    action: Action,
    raw_text: String,
    priority: usize,
}

impl MatchRule {
    pub(crate) fn new(action: Action, raw_text: String) -> Self {
        Self {
            action,
            raw_text,
            priority: 0,
        }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn priority(&self) -> usize {
        self.priority
    }

    pub fn set_action(&mut self, action: Action) -> Result<(), RulesError> {
        let line = checked_render(format!("MATCH,{action}"), |parsed| {
            parsed.as_match().is_some_and(|p| p.action == action)
        })?;
        self.action = action;
        self.raw_text = line;
        Ok(())
    }

    pub fn render(&self) -> String {
        format!("MATCH,{}", self.action)
    }
}

/// A parsed rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Condition(ConditionRule),
    Logic(LogicRule),
    Match(MatchRule),
}

impl Rule {
    pub fn rule_type(&self) -> RuleType {
        match self {
            Rule::Condition(r) => r.rule_type(),
            Rule::Logic(r) => r.logic_type().rule_type(),
            Rule::Match(_) => RuleType::Match,
        }
    }

    pub fn action(&self) -> &Action {
        match self {
            Rule::Condition(r) => r.action(),
            Rule::Logic(r) => r.action(),
            Rule::Match(r) => r.action(),
        }
    }

    /// Payload of a plain condition rule; `None` for logic and MATCH rules.
    pub fn payload(&self) -> Option<&str> {
        match self {
            Rule::Condition(r) => Some(r.payload()),
            _ => None,
        }
    }

    pub fn raw_text(&self) -> &str {
        match self {
            Rule::Condition(r) => r.raw_text(),
            Rule::Logic(r) => r.raw_text(),
            Rule::Match(r) => r.raw_text(),
        }
    }

    /// Position of this rule in its store (0 = evaluated first).
    pub fn priority(&self) -> usize {
        match self {
            Rule::Condition(r) => r.priority,
            Rule::Logic(r) => r.priority,
            Rule::Match(r) => r.priority,
        }
    }

    pub(crate) fn set_priority(&mut self, priority: usize) {
        match self {
            Rule::Condition(r) => r.priority = priority,
            Rule::Logic(r) => r.priority = priority,
            Rule::Match(r) => r.priority = priority,
        }
    }

    /// Declare the priority this rule should take, e.g. before handing it
    /// to [`RuleStore::update_at`](crate::RuleStore::update_at).
    pub fn with_priority(mut self, priority: usize) -> Self {
        self.set_priority(priority);
        self
    }

    /// Replace the action, re-rendering the raw text.
    ///
    /// Group names that are empty, collide with a built-in action, or
    /// contain a `,` are rejected.
    pub fn set_action(&mut self, action: Action) -> Result<(), RulesError> {
        match self {
            Rule::Condition(r) => r.set_action(action),
            Rule::Logic(r) => r.set_action(action),
            Rule::Match(r) => r.set_action(action),
        }
    }

    /// Canonical line derived from the fields rather than the raw text.
    pub fn render(&self) -> String {
        match self {
            Rule::Condition(r) => r.render(),
            Rule::Logic(r) => r.render(),
            Rule::Match(r) => r.render(),
        }
    }

    /// Structural equality ignoring priority and raw text.
    ///
    /// MATCH rules compare by action only; logic rules by type, action and
    /// conditions; plain rules by type, action and payload.
    pub fn is_same_rule(&self, other: &Rule) -> bool {
        match (self, other) {
            (Rule::Match(a), Rule::Match(b)) => a.action == b.action,
            (Rule::Logic(a), Rule::Logic(b)) => {
                a.logic_type == b.logic_type
                    && a.action == b.action
                    && a.conditions == b.conditions
            }
            (Rule::Condition(a), Rule::Condition(b)) => {
                a.rule_type == b.rule_type && a.action == b.action && a.payload == b.payload
            }
            _ => false,
        }
    }

    pub fn as_condition(&self) -> Option<&ConditionRule> {
        match self {
            Rule::Condition(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_logic(&self) -> Option<&LogicRule> {
        match self {
            Rule::Logic(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_match(&self) -> Option<&MatchRule> {
        match self {
            Rule::Match(r) => Some(r),
            _ => None,
        }
    }
}

/// Keep a rendered line only if it parses back to the edited fields, so
/// that `raw_text` always reloads as the same rule.
fn checked_render(
    line: String,
    matches: impl FnOnce(&Rule) -> bool,
) -> Result<String, RulesError> {
    let parsed = crate::parser::parse_line(&line)?;
    if matches(&parsed) {
        Ok(line)
    } else {
        Err(RulesError::InvalidRuleFormat(format!(
            "edited rule does not parse back to the same fields: {line}"
        )))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw_text())
    }
}

impl FromStr for Rule {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse_line(s)
    }
}
