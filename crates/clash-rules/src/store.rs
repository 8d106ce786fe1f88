//! Priority-ordered rule store.
//!
//! Position in the store is evaluation order (first match wins), and every
//! rule's `priority` mirrors its position. After each mutation the
//! priorities are exactly `0..len`.

use std::slice;

use tracing::debug;

use crate::error::RulesError;
use crate::parser::{self, ParseFailure, RuleInput};
use crate::record::RuleRecord;
use crate::rule::{Action, ConditionRule, Rule, RuleType};

/// An ordered, mutable list of rules.
///
/// The store has no interior locking. Embedders that share it between
/// threads wrap the whole store in a single lock.
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    rules: Vec<Rule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build a store from parsed inputs, returning it with the failures.
    pub fn from_inputs<I>(inputs: I) -> (Self, Vec<ParseFailure>)
    where
        I: IntoIterator,
        I::Item: RuleInput,
    {
        let mut store = Self::new();
        let failures = store.replace_all(inputs);
        (store, failures)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    // ── Bulk load ──

    /// Replace the whole store with the rules parsed from `inputs`.
    ///
    /// Each input is parsed independently; unparseable inputs are skipped
    /// and returned. The parsed rules keep their input order.
    pub fn replace_all<I>(&mut self, inputs: I) -> Vec<ParseFailure>
    where
        I: IntoIterator,
        I::Item: RuleInput,
    {
        let outcome = parser::parse_many(inputs);
        self.rules = outcome.rules;
        self.normalize();
        debug!(
            rules = self.rules.len(),
            failures = outcome.failures.len(),
            "replaced rule store contents"
        );
        outcome.failures
    }

    /// [`replace_all`](Self::replace_all) over structured records.
    pub fn replace_all_records(&mut self, records: &[RuleRecord]) -> Vec<ParseFailure> {
        self.replace_all(records)
    }

    // ── Insertion ──

    /// Append a rule after every existing rule.
    pub fn append(&mut self, mut rule: Rule) {
        let priority = self.next_priority();
        rule.set_priority(priority);
        self.rules.push(rule);
        self.normalize();
        debug!(priority, "appended rule");
    }

    /// Append a batch of rules, keeping their relative order.
    pub fn append_many<I>(&mut self, rules: I)
    where
        I: IntoIterator<Item = Rule>,
    {
        let start = self.next_priority();
        let mut count = 0;
        for (offset, mut rule) in rules.into_iter().enumerate() {
            rule.set_priority(start + offset);
            self.rules.push(rule);
            count += 1;
        }
        self.normalize();
        debug!(start, count, "appended rules");
    }

    /// Append a rule unless an equivalent one (see [`contains`](Self::contains))
    /// is already present.
    pub fn try_append(&mut self, rule: Rule) -> Result<(), RulesError> {
        if self.contains(&rule) {
            return Err(RulesError::DuplicateRule(rule.raw_text().to_string()));
        }
        self.append(rule);
        Ok(())
    }

    /// Insert a rule at `priority`, shifting that rule and every later one
    /// down by one. Targets past the end append.
    pub fn insert_at(&mut self, mut rule: Rule, priority: usize) {
        let priority = priority.min(self.rules.len());
        for existing in &mut self.rules {
            if existing.priority() >= priority {
                existing.set_priority(existing.priority() + 1);
            }
        }
        rule.set_priority(priority);
        self.rules.push(rule);
        self.normalize();
        debug!(priority, "inserted rule");
    }

    // ── Lookup ──

    pub fn get_at(&self, priority: usize) -> Option<&Rule> {
        self.rules.get(self.index_of(priority)?)
    }

    /// Like [`get_at`](Self::get_at), for callers that propagate a missing
    /// rule as an error.
    pub fn try_get_at(&self, priority: usize) -> Result<&Rule, RulesError> {
        self.get_at(priority).ok_or(RulesError::NotFound(priority))
    }

    /// Equivalent rule present, ignoring priority. See [`Rule::is_same_rule`].
    pub fn contains(&self, candidate: &Rule) -> bool {
        self.rules.iter().any(|r| r.is_same_rule(candidate))
    }

    /// Plain condition rules of the given type.
    pub fn filter_by_type(&self, rule_type: RuleType) -> Vec<&ConditionRule> {
        self.rules
            .iter()
            .filter_map(Rule::as_condition)
            .filter(|r| r.rule_type() == rule_type)
            .collect()
    }

    pub fn filter_by_action(&self, action: &Action) -> Vec<&Rule> {
        self.filter(|r| r.action() == action)
    }

    pub fn filter<F>(&self, mut predicate: F) -> Vec<&Rule>
    where
        F: FnMut(&Rule) -> bool,
    {
        self.rules.iter().filter(|r| predicate(r)).collect()
    }

    // ── Update / removal ──

    /// Replace the rule at `priority` with `rule`.
    ///
    /// When `rule` declares a different priority, the old rule is removed
    /// and `rule` is inserted at its declared priority, so one call moves
    /// and replaces. Returns false when nothing occupies `priority`.
    pub fn update_at(&mut self, mut rule: Rule, priority: usize) -> bool {
        let Some(index) = self.index_of(priority) else {
            return false;
        };

        let target = rule.priority();
        if target == priority {
            rule.set_priority(priority);
            self.rules[index] = rule;
            debug!(priority, "updated rule in place");
        } else {
            self.remove_at(priority);
            self.insert_at(rule, target);
            debug!(from = priority, to = target, "updated and moved rule");
        }
        true
    }

    /// Remove the rule at `priority`, closing the gap it leaves.
    pub fn remove_at(&mut self, priority: usize) -> Option<Rule> {
        let index = self.index_of(priority)?;
        let removed = self.rules.remove(index);
        for rule in &mut self.rules {
            if rule.priority() > priority {
                rule.set_priority(rule.priority() - 1);
            }
        }
        self.normalize();
        debug!(priority, "removed rule");
        Some(removed)
    }

    /// Remove every rule matching `predicate`, one at a time, closing each
    /// gap as it goes. Returns how many were removed.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&Rule) -> bool,
    {
        let mut removed = 0;
        loop {
            let Some(priority) = self
                .rules
                .iter()
                .find(|r| predicate(r))
                .map(Rule::priority)
            else {
                break;
            };
            self.remove_at(priority);
            removed += 1;
        }
        removed
    }

    // ── Reordering ──

    /// Move a rule by removing it and inserting it again at `to`.
    /// Returns false when nothing occupies `from`.
    pub fn move_rule(&mut self, from: usize, to: usize) -> bool {
        let Some(rule) = self.remove_at(from) else {
            return false;
        };
        self.insert_at(rule, to);
        true
    }

    /// Move a rule by shifting only the rules between `from` and `to`.
    ///
    /// Produces the same order as [`move_rule`](Self::move_rule). Returns
    /// false when nothing occupies `from`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let Some(index) = self.index_of(from) else {
            return false;
        };
        let to = to.min(self.rules.len() - 1);
        if from == to {
            return true;
        }

        for rule in &mut self.rules {
            let p = rule.priority();
            if from < to && p > from && p <= to {
                rule.set_priority(p - 1);
            } else if from > to && p >= to && p < from {
                rule.set_priority(p + 1);
            }
        }
        self.rules[index].set_priority(to);
        self.normalize();
        debug!(from, to, "reordered rule");
        true
    }

    // ── Serialization ──

    /// Raw text of every rule, in priority order.
    pub fn to_text(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.raw_text().to_string()).collect()
    }

    /// Structured form of every rule, in priority order.
    pub fn to_structured(&self) -> Vec<RuleRecord> {
        self.rules.iter().map(RuleRecord::from).collect()
    }

    // ── Internal ──

    fn index_of(&self, priority: usize) -> Option<usize> {
        self.rules.iter().position(|r| r.priority() == priority)
    }

    fn next_priority(&self) -> usize {
        self.rules
            .iter()
            .map(Rule::priority)
            .max()
            .map_or(0, |p| p + 1)
    }

    /// Stable-sort by priority, then renumber `0..len`.
    fn normalize(&mut self) {
        self.rules.sort_by_key(Rule::priority);
        for (index, rule) in self.rules.iter_mut().enumerate() {
            rule.set_priority(index);
        }
    }
}

impl<'a> IntoIterator for &'a RuleStore {
    type Item = &'a Rule;
    type IntoIter = slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
