//! Configuration for the ActionKit adaptor.
//!
//! Read from the environment:
//!   AK_BASE_URL          ActionKit instance root, e.g. https://act.example.org
//!   AK_USERNAME          REST API user
//!   AK_PASSWORD          REST API password
//!   AK_EVENT_URL_BASE    prefix for each event's browser_url
//!   AK_DEFAULT_CAMPAIGN  campaign id attached to every created/edited event

use std::collections::HashMap;

use config::{Config, Environment};
use osdi_core::{OsdiError, OsdiResult};
use serde::Deserialize;

const ENV_PREFIX: &str = "AK";

#[derive(Debug, Clone, Deserialize)]
pub struct ActionKitConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub event_url_base: String,
    pub default_campaign: String,
}

impl ActionKitConfig {
    pub fn from_env() -> OsdiResult<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as `from_env`, but reads `AK_*` variables from `vars` instead of
    /// the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> OsdiResult<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(source: Environment) -> OsdiResult<Self> {
        let config: ActionKitConfig = Config::builder()
            .add_source(source)
            .build()
            .map_err(|e| OsdiError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| OsdiError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> OsdiResult<()> {
        let required = [
            ("AK_BASE_URL", &self.base_url),
            ("AK_USERNAME", &self.username),
            ("AK_PASSWORD", &self.password),
            ("AK_EVENT_URL_BASE", &self.event_url_base),
            ("AK_DEFAULT_CAMPAIGN", &self.default_campaign),
        ];

        for (var, value) in required {
            if value.trim().is_empty() {
                return Err(OsdiError::Config(format!(
                    "Missing env var {var} - required for ActionKit adaptor"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_loads_all_variables() {
        let config = ActionKitConfig::from_vars(vars(&[
            ("AK_BASE_URL", "https://act.example.org"),
            ("AK_USERNAME", "ak"),
            ("AK_PASSWORD", "secret"),
            ("AK_EVENT_URL_BASE", "https://act.example.org/event/local"),
            ("AK_DEFAULT_CAMPAIGN", "7"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://act.example.org");
        assert_eq!(config.username, "ak");
        assert_eq!(config.event_url_base, "https://act.example.org/event/local");
        assert_eq!(config.default_campaign, "7");
    }

    #[test]
    fn test_missing_variable_is_config_error() {
        let err = ActionKitConfig::from_vars(vars(&[
            ("AK_BASE_URL", "https://act.example.org"),
            ("AK_USERNAME", "ak"),
            ("AK_PASSWORD", "secret"),
            ("AK_EVENT_URL_BASE", "https://act.example.org/event/local"),
        ]))
        .unwrap_err();

        assert!(matches!(err, OsdiError::Config(_)));
    }

    #[test]
    fn test_blank_variable_is_config_error() {
        let err = ActionKitConfig::from_vars(vars(&[
            ("AK_BASE_URL", "https://act.example.org"),
            ("AK_USERNAME", "ak"),
            ("AK_PASSWORD", " "),
            ("AK_EVENT_URL_BASE", "https://act.example.org/event/local"),
            ("AK_DEFAULT_CAMPAIGN", "7"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("AK_PASSWORD"));
    }
}
