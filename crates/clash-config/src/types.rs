//! Rule-provider and proxy-group schema types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_HEALTH_CHECK_TIMEOUT_MS, DEFAULT_HEALTH_CHECK_URL,
    DEFAULT_PROVIDER_INTERVAL_SECS, default_lazy, default_max_failed_times,
};

/// The parts of a Clash config this crate validates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClashConfig {
    /// Rule-set providers, referenced by name from `RULE-SET` rules.
    #[serde(default)]
    pub rule_providers: HashMap<String, RuleProviderConfig>,
    #[serde(default)]
    pub proxy_groups: Vec<ProxyGroupConfig>,
    /// Ordered rule lines (first match wins).
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Http,
    File,
    Inline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBehavior {
    Domain,
    Ipcidr,
    #[default]
    Classical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFormat {
    #[default]
    Yaml,
    Text,
    /// Binary rule-set; only valid for `domain` and `ipcidr` behaviors.
    Mrs,
}

/// Rule-set provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleProviderConfig {
    /// Source: "http", "file" or "inline".
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(default)]
    pub behavior: ProviderBehavior,
    #[serde(default)]
    pub format: ProviderFormat,
    /// Remote URL (required for http).
    #[serde(default)]
    pub url: Option<String>,
    /// Local path (required for file, cache location for http).
    #[serde(default)]
    pub path: Option<String>,
    /// Update interval in seconds.
    #[serde(default)]
    pub interval: Option<u64>,
    /// Proxy or group used to fetch an http provider.
    #[serde(default)]
    pub proxy: Option<String>,
    /// Maximum download size in bytes.
    #[serde(default)]
    pub size_limit: Option<u64>,
    #[serde(default)]
    pub header: Option<HashMap<String, Vec<String>>>,
    /// Rule entries (required for inline).
    #[serde(default)]
    pub payload: Option<Vec<String>>,
}

impl RuleProviderConfig {
    /// Update interval, falling back to the default for http providers.
    pub fn effective_interval(&self) -> Option<u64> {
        match self.provider_type {
            ProviderType::Http => Some(self.interval.unwrap_or(DEFAULT_PROVIDER_INTERVAL_SECS)),
            _ => self.interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyGroupType {
    Select,
    Relay,
    Fallback,
    UrlTest,
    LoadBalance,
}

impl ProxyGroupType {
    /// Whether the group picks its member by health checks.
    pub fn uses_health_check(self) -> bool {
        matches!(
            self,
            ProxyGroupType::Fallback | ProxyGroupType::UrlTest | ProxyGroupType::LoadBalance
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalanceStrategy {
    ConsistentHashing,
    RoundRobin,
    StickySessions,
}

/// Proxy group configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProxyGroupConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: ProxyGroupType,
    /// Member proxies or groups, by name.
    #[serde(default)]
    pub proxies: Vec<String>,
    /// Proxy providers supplying members.
    #[serde(default, rename = "use")]
    pub use_providers: Vec<String>,
    /// Health check URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Health check interval in seconds.
    #[serde(default)]
    pub interval: Option<u64>,
    /// Health check timeout in milliseconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default = "default_lazy")]
    pub lazy: bool,
    #[serde(default = "default_max_failed_times")]
    pub max_failed_times: u32,
    /// Latency tolerance in milliseconds (url-test only).
    #[serde(default)]
    pub tolerance: Option<u64>,
    /// Balancing strategy (load-balance only).
    #[serde(default)]
    pub strategy: Option<LoadBalanceStrategy>,
    #[serde(default)]
    pub include_all: bool,
    #[serde(default)]
    pub include_all_proxies: bool,
    #[serde(default)]
    pub include_all_providers: bool,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub exclude_filter: Option<String>,
    #[serde(default)]
    pub disable_udp: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub icon: Option<String>,
}

impl ProxyGroupConfig {
    /// True when the group draws members from at least one source.
    pub fn has_members(&self) -> bool {
        !self.proxies.is_empty()
            || !self.use_providers.is_empty()
            || self.include_all
            || self.include_all_proxies
            || self.include_all_providers
    }

    pub fn health_check_url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_HEALTH_CHECK_URL)
    }

    pub fn health_check_interval(&self) -> u64 {
        self.interval.unwrap_or(DEFAULT_HEALTH_CHECK_INTERVAL_SECS)
    }

    pub fn health_check_timeout(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_HEALTH_CHECK_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_defaults() {
        let cfg: RuleProviderConfig =
            serde_json::from_str(r#"{"type": "http", "url": "https://example.com/r.yaml"}"#)
                .unwrap();
        assert_eq!(cfg.provider_type, ProviderType::Http);
        assert_eq!(cfg.behavior, ProviderBehavior::Classical);
        assert_eq!(cfg.format, ProviderFormat::Yaml);
        assert_eq!(cfg.effective_interval(), Some(86_400));
        assert!(cfg.payload.is_none());
    }

    #[test]
    fn provider_full() {
        let cfg: RuleProviderConfig = serde_json::from_str(
            r#"{
                "type": "http",
                "behavior": "ipcidr",
                "format": "mrs",
                "url": "https://example.com/cn.mrs",
                "path": "./rules/cn.mrs",
                "interval": 3600,
                "proxy": "DIRECT",
                "size-limit": 1048576,
                "header": {"User-Agent": ["mihomo"]}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.behavior, ProviderBehavior::Ipcidr);
        assert_eq!(cfg.format, ProviderFormat::Mrs);
        assert_eq!(cfg.size_limit, Some(1_048_576));
        assert_eq!(cfg.effective_interval(), Some(3600));
        assert_eq!(cfg.header.unwrap()["User-Agent"], vec!["mihomo"]);
    }

    #[test]
    fn file_provider_has_no_default_interval() {
        let cfg: RuleProviderConfig =
            serde_json::from_str(r#"{"type": "file", "path": "a.yaml"}"#).unwrap();
        assert_eq!(cfg.effective_interval(), None);
    }

    #[test]
    fn group_defaults() {
        let cfg: ProxyGroupConfig =
            serde_json::from_str(r#"{"name": "Auto", "type": "url-test", "proxies": ["a"]}"#)
                .unwrap();
        assert_eq!(cfg.group_type, ProxyGroupType::UrlTest);
        assert!(cfg.lazy);
        assert_eq!(cfg.max_failed_times, 5);
        assert_eq!(cfg.health_check_url(), "https://www.gstatic.com/generate_204");
        assert_eq!(cfg.health_check_interval(), 300);
        assert_eq!(cfg.health_check_timeout(), 5000);
        assert!(cfg.group_type.uses_health_check());
        assert!(cfg.has_members());
    }

    #[test]
    fn group_kebab_case_fields() {
        let cfg: ProxyGroupConfig = serde_json::from_str(
            r#"{
                "name": "LB",
                "type": "load-balance",
                "use": ["provider-a"],
                "strategy": "round-robin",
                "include-all-proxies": true,
                "exclude-filter": "(?i)expired",
                "disable-udp": true,
                "lazy": false
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.use_providers, vec!["provider-a"]);
        assert_eq!(cfg.strategy, Some(LoadBalanceStrategy::RoundRobin));
        assert!(cfg.include_all_proxies);
        assert!(cfg.disable_udp);
        assert!(!cfg.lazy);
    }

    #[test]
    fn group_without_members() {
        let cfg: ProxyGroupConfig =
            serde_json::from_str(r#"{"name": "Empty", "type": "select"}"#).unwrap();
        assert!(!cfg.has_members());
        assert!(!cfg.group_type.uses_health_check());
    }
}
