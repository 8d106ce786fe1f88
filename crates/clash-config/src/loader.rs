//! Config text parsing and error types.

use clash_rules::RulesError;

use crate::ClashConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rules: {0}")]
    Rules(#[from] RulesError),
    #[error("validation: {0}")]
    Validation(String),
}

/// Parse a config document from JSON text. `//` and `/* */` comments are
/// allowed.
///
/// Reading the text from disk or the network is left to the caller.
pub fn parse_config(text: &str) -> Result<ClashConfig, ConfigError> {
    let stripped = json_comments::StripComments::new(text.as_bytes());
    Ok(serde_json::from_reader(stripped)?)
}
