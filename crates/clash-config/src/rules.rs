//! Bridge between clash-config and clash-rules.
//!
//! Loads the `rules` section of a config into a [`RuleStore`].

use clash_rules::{ParseFailure, RuleStore};

use crate::ClashConfig;
use crate::loader::ConfigError;

/// Build a rule store from the config's rule lines.
///
/// Lines that fail to parse are skipped and returned alongside the store;
/// the remaining rules keep their relative order.
pub fn build_rule_store(config: &ClashConfig) -> (RuleStore, Vec<ParseFailure>) {
    let (store, failures) = RuleStore::from_inputs(&config.rules);
    tracing::info!(
        loaded = store.len(),
        skipped = failures.len(),
        "rule store built from config"
    );
    (store, failures)
}

/// Build a rule store, failing on the first rule line that does not parse.
pub fn build_rule_store_strict(config: &ClashConfig) -> Result<RuleStore, ConfigError> {
    let (store, mut failures) = build_rule_store(config);
    if failures.is_empty() {
        return Ok(store);
    }
    Err(ConfigError::Rules(failures.swap_remove(0).error))
}
