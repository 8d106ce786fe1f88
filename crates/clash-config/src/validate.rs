//! Configuration validation logic.

use std::collections::HashSet;

use clash_rules::{Action, Rule, RuleInput, RuleType, parse_line};
use tracing::debug;

use crate::loader::ConfigError;
use crate::types::{
    ClashConfig, ProviderBehavior, ProviderFormat, ProviderType, ProxyGroupConfig,
    ProxyGroupType, RuleProviderConfig,
};

pub fn validate_rule_provider(name: &str, provider: &RuleProviderConfig) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation("rule-providers: empty provider name".into()));
    }
    match provider.provider_type {
        ProviderType::Http => {
            let url = provider.url.as_deref().unwrap_or("").trim();
            if url.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rule-providers.{name}.url is required for http providers"
                )));
            }
            if !is_http_url(url) {
                return Err(ConfigError::Validation(format!(
                    "rule-providers.{name}.url must be an http(s) URL"
                )));
            }
        }
        ProviderType::File => {
            if provider.path.as_deref().unwrap_or("").trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rule-providers.{name}.path is required for file providers"
                )));
            }
        }
        ProviderType::Inline => {
            if provider.payload.as_ref().is_none_or(|p| p.is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "rule-providers.{name}.payload is required for inline providers"
                )));
            }
            if provider.format == ProviderFormat::Mrs {
                return Err(ConfigError::Validation(format!(
                    "rule-providers.{name}.format cannot be mrs for inline providers"
                )));
            }
        }
    }
    if provider.format == ProviderFormat::Mrs && provider.behavior == ProviderBehavior::Classical {
        return Err(ConfigError::Validation(format!(
            "rule-providers.{name}.format mrs requires behavior domain or ipcidr"
        )));
    }
    if provider.interval == Some(0) {
        return Err(ConfigError::Validation(format!(
            "rule-providers.{name}.interval must be > 0"
        )));
    }
    Ok(())
}

pub fn validate_proxy_group(group: &ProxyGroupConfig) -> Result<(), ConfigError> {
    let name = group.name.trim();
    if name.is_empty() {
        return Err(ConfigError::Validation("proxy-groups: empty group name".into()));
    }
    if Action::parse(name).is_builtin() {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}: name collides with built-in action"
        )));
    }
    if !group.has_members() {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}: needs proxies, use, or include-all"
        )));
    }
    if group.proxies.iter().any(|p| p == &group.name) {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}: group cannot contain itself"
        )));
    }
    if group.tolerance.is_some() && group.group_type != ProxyGroupType::UrlTest {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}.tolerance is only valid for url-test groups"
        )));
    }
    if group.strategy.is_some() && group.group_type != ProxyGroupType::LoadBalance {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}.strategy is only valid for load-balance groups"
        )));
    }
    if group.interval == Some(0) {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}.interval must be > 0"
        )));
    }
    if group.timeout == Some(0) {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}.timeout must be > 0"
        )));
    }
    if let Some(url) = &group.url
        && !is_http_url(url.trim())
    {
        return Err(ConfigError::Validation(format!(
            "proxy-groups.{name}.url must be an http(s) URL"
        )));
    }
    Ok(())
}

/// Validate providers, groups, and every rule line, including references
/// from rules to providers and groups.
///
/// Rule actions are only checked against proxy groups when the config
/// declares at least one group.
pub fn validate_config(config: &ClashConfig) -> Result<(), ConfigError> {
    for (name, provider) in &config.rule_providers {
        validate_rule_provider(name, provider)?;
    }

    let mut group_names = HashSet::new();
    for group in &config.proxy_groups {
        validate_proxy_group(group)?;
        if !group_names.insert(group.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "proxy-groups.{}: duplicate group name",
                group.name
            )));
        }
    }

    let targets: HashSet<&str> = config
        .proxy_groups
        .iter()
        .flat_map(|g| std::iter::once(g.name.as_str()).chain(g.proxies.iter().map(String::as_str)))
        .collect();

    for (index, line) in config.rules.iter().enumerate() {
        if line.is_blank() {
            continue;
        }
        let rule = parse_line(line)
            .map_err(|e| ConfigError::Validation(format!("rules[{index}]: {e}")))?;

        for provider in rule_set_references(&rule) {
            if !config.rule_providers.contains_key(provider) {
                return Err(ConfigError::Validation(format!(
                    "rules[{index}]: unknown rule-provider '{provider}'"
                )));
            }
        }

        if let Some(group) = rule.action().as_group()
            && !config.proxy_groups.is_empty()
            && !targets.contains(group)
        {
            return Err(ConfigError::Validation(format!(
                "rules[{index}]: unknown proxy group '{group}'"
            )));
        }
    }

    debug!(
        providers = config.rule_providers.len(),
        groups = config.proxy_groups.len(),
        rules = config.rules.len(),
        "config validated"
    );
    Ok(())
}

/// Provider names a rule refers to through `RULE-SET`.
fn rule_set_references(rule: &Rule) -> Vec<&str> {
    match rule {
        Rule::Condition(r) if r.rule_type() == RuleType::RuleSet => vec![r.payload()],
        Rule::Logic(r) => r
            .conditions()
            .iter()
            .filter(|c| c.rule_type == RuleType::RuleSet)
            .map(|c| c.payload.as_str())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_config;

    fn provider(json: &str) -> RuleProviderConfig {
        serde_json::from_str(json).unwrap()
    }

    fn group(json: &str) -> ProxyGroupConfig {
        serde_json::from_str(json).unwrap()
    }

    fn validation_message(result: Result<(), ConfigError>) -> String {
        match result {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn http_provider_requires_url() {
        let msg = validation_message(validate_rule_provider("ads", &provider(r#"{"type": "http"}"#)));
        assert!(msg.contains("rule-providers.ads.url"));

        let msg = validation_message(validate_rule_provider(
            "ads",
            &provider(r#"{"type": "http", "url": "ftp://example.com/a"}"#),
        ));
        assert!(msg.contains("http(s)"));

        validate_rule_provider(
            "ads",
            &provider(r#"{"type": "http", "url": "https://example.com/a.yaml"}"#),
        )
        .unwrap();
    }

    #[test]
    fn file_provider_requires_path() {
        let msg = validation_message(validate_rule_provider("local", &provider(r#"{"type": "file"}"#)));
        assert!(msg.contains("path"));
        validate_rule_provider("local", &provider(r#"{"type": "file", "path": "./a.yaml"}"#))
            .unwrap();
    }

    #[test]
    fn inline_provider_requires_payload() {
        let msg = validation_message(validate_rule_provider(
            "inline",
            &provider(r#"{"type": "inline", "payload": []}"#),
        ));
        assert!(msg.contains("payload"));
        validate_rule_provider(
            "inline",
            &provider(r#"{"type": "inline", "behavior": "domain", "payload": ["+.example.com"]}"#),
        )
        .unwrap();
    }

    #[test]
    fn mrs_requires_domain_or_ipcidr() {
        let msg = validation_message(validate_rule_provider(
            "cn",
            &provider(r#"{"type": "http", "url": "https://e.com/cn.mrs", "format": "mrs"}"#),
        ));
        assert!(msg.contains("mrs"));
        validate_rule_provider(
            "cn",
            &provider(
                r#"{"type": "http", "url": "https://e.com/cn.mrs", "format": "mrs", "behavior": "ipcidr"}"#,
            ),
        )
        .unwrap();
        validation_message(validate_rule_provider(
            "cn",
            &provider(r#"{"type": "inline", "format": "mrs", "behavior": "domain", "payload": ["a.com"]}"#),
        ));
    }

    #[test]
    fn provider_zero_interval() {
        let msg = validation_message(validate_rule_provider(
            "ads",
            &provider(r#"{"type": "file", "path": "a.yaml", "interval": 0}"#),
        ));
        assert!(msg.contains("interval"));
    }

    #[test]
    fn group_checks() {
        validate_proxy_group(&group(r#"{"name": "Proxy", "type": "select", "proxies": ["a"]}"#))
            .unwrap();
        validation_message(validate_proxy_group(&group(
            r#"{"name": " ", "type": "select", "proxies": ["a"]}"#,
        )));
        validation_message(validate_proxy_group(&group(
            r#"{"name": "direct", "type": "select", "proxies": ["a"]}"#,
        )));
        validation_message(validate_proxy_group(&group(r#"{"name": "Empty", "type": "select"}"#)));
        validation_message(validate_proxy_group(&group(
            r#"{"name": "Loop", "type": "select", "proxies": ["Loop"]}"#,
        )));
        validate_proxy_group(&group(r#"{"name": "All", "type": "select", "include-all": true}"#))
            .unwrap();
    }

    #[test]
    fn group_type_specific_fields() {
        let msg = validation_message(validate_proxy_group(&group(
            r#"{"name": "S", "type": "select", "proxies": ["a"], "tolerance": 50}"#,
        )));
        assert!(msg.contains("tolerance"));
        validate_proxy_group(&group(
            r#"{"name": "T", "type": "url-test", "proxies": ["a"], "tolerance": 50}"#,
        ))
        .unwrap();

        let msg = validation_message(validate_proxy_group(&group(
            r#"{"name": "F", "type": "fallback", "proxies": ["a"], "strategy": "round-robin"}"#,
        )));
        assert!(msg.contains("strategy"));
        validate_proxy_group(&group(
            r#"{"name": "LB", "type": "load-balance", "proxies": ["a"], "strategy": "sticky-sessions"}"#,
        ))
        .unwrap();
    }

    #[test]
    fn group_health_check_values() {
        validation_message(validate_proxy_group(&group(
            r#"{"name": "T", "type": "url-test", "proxies": ["a"], "interval": 0}"#,
        )));
        validation_message(validate_proxy_group(&group(
            r#"{"name": "T", "type": "url-test", "proxies": ["a"], "timeout": 0}"#,
        )));
        validation_message(validate_proxy_group(&group(
            r#"{"name": "T", "type": "url-test", "proxies": ["a"], "url": "gstatic.com"}"#,
        )));
    }

    const FULL: &str = r#"{
        "rule-providers": {
            "ads": {"type": "http", "url": "https://example.com/ads.yaml", "behavior": "domain"},
            "lan": {"type": "inline", "behavior": "ipcidr", "payload": ["192.168.0.0/16"]}
        },
        "proxy-groups": [
            {"name": "Proxy", "type": "select", "proxies": ["Auto", "hk-01", "DIRECT"]},
            {"name": "Auto", "type": "url-test", "proxies": ["hk-01", "jp-01"]}
        ],
        "rules": [
            "RULE-SET,ads,REJECT",
            "AND,((RULE-SET,lan),(NETWORK,UDP)),DIRECT",
            "DOMAIN-SUFFIX,jp.example,jp-01",
            "MATCH,Proxy"
        ]
    }"#;

    #[test]
    fn full_config_valid() {
        validate_config(&parse_config(FULL).unwrap()).unwrap();
    }

    #[test]
    fn duplicate_group_names() {
        let mut config = parse_config(FULL).unwrap();
        let duplicate = config.proxy_groups[1].clone();
        config.proxy_groups.push(duplicate);
        let msg = validation_message(validate_config(&config));
        assert!(msg.contains("duplicate"));
    }

    #[test]
    fn unparseable_rule_line() {
        let mut config = parse_config(FULL).unwrap();
        config.rules.insert(1, "FOO,bar,DIRECT".into());
        let msg = validation_message(validate_config(&config));
        assert!(msg.starts_with("rules[1]"));
        assert!(msg.contains("unknown rule type"));
    }

    #[test]
    fn unknown_rule_provider_reference() {
        let mut config = parse_config(FULL).unwrap();
        config.rules.push("RULE-SET,missing,DIRECT".into());
        let msg = validation_message(validate_config(&config));
        assert!(msg.contains("unknown rule-provider 'missing'"));

        let mut config = parse_config(FULL).unwrap();
        config.rule_providers.remove("lan");
        let msg = validation_message(validate_config(&config));
        assert!(msg.contains("'lan'"));
    }

    #[test]
    fn unknown_proxy_group_reference() {
        let mut config = parse_config(FULL).unwrap();
        config.rules.push("DOMAIN,x.com,Nowhere".into());
        let msg = validation_message(validate_config(&config));
        assert!(msg.contains("unknown proxy group 'Nowhere'"));
    }

    #[test]
    fn group_references_skipped_without_groups() {
        let mut config = parse_config(FULL).unwrap();
        config.proxy_groups.clear();
        config.rules.push("DOMAIN,x.com,Nowhere".into());
        validate_config(&config).unwrap();
    }
}
