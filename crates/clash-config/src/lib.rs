//! Configuration schema, loading and validation for Clash rule sections.
//!
//! Covers `rule-providers`, `proxy-groups` and `rules`, and checks that
//! rules only reference providers and groups that exist.

pub mod defaults;
pub mod loader;
pub mod rules;
pub mod types;
pub mod validate;

pub use loader::{ConfigError, parse_config};
pub use rules::{build_rule_store, build_rule_store_strict};
pub use types::{
    ClashConfig, LoadBalanceStrategy, ProviderBehavior, ProviderFormat, ProviderType,
    ProxyGroupConfig, ProxyGroupType, RuleProviderConfig,
};
pub use validate::{validate_config, validate_proxy_group, validate_rule_provider};
