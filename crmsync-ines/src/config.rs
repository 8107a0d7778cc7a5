//! Connection settings resolution for crmsync-ines
//!
//! Credentials resolve with ENV → TOML priority, so the password can stay
//! out of the config file. All three required keys (`compte`, `userName`,
//! `password`) must be present before a session can be opened.

use crate::error::{IntegrationError, IntegrationResult};
use crmsync_common::config::{InesConfig, TomlConfig};
use tracing::{info, warn};

/// Environment override for the account
pub const ACCOUNT_ENV_VAR: &str = "CRMSYNC_INES_ACCOUNT";

/// Environment override for the user name
pub const USERNAME_ENV_VAR: &str = "CRMSYNC_INES_USERNAME";

/// Environment override for the password
pub const PASSWORD_ENV_VAR: &str = "CRMSYNC_INES_PASSWORD";

/// Resolved connection settings
#[derive(Clone)]
pub struct InesSettings {
    pub base_url: String,
    pub account: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for InesSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InesSettings")
            .field("base_url", &self.base_url)
            .field("account", &self.account)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Resolve connection settings from environment and TOML
pub fn resolve_ines_settings(toml_config: &TomlConfig) -> IntegrationResult<InesSettings> {
    let ines: &InesConfig = &toml_config.ines;

    let settings = InesSettings {
        base_url: ines.base_url.clone(),
        account: resolve_value("account", ACCOUNT_ENV_VAR, &ines.account),
        username: resolve_value("userName", USERNAME_ENV_VAR, &ines.username),
        password: resolve_value("password", PASSWORD_ENV_VAR, &ines.password),
        timeout_secs: ines.timeout_secs,
    };

    validate(&settings)?;
    Ok(settings)
}

fn resolve_value(key: &str, env_var: &str, toml_value: &str) -> String {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_value(v));

    match env_value {
        Some(value) => {
            if is_valid_value(toml_value) {
                warn!(
                    "Ines {} found in both environment and TOML. Using environment.",
                    key
                );
            }
            info!("Ines {} loaded from environment variable", key);
            value
        }
        None => toml_value.to_string(),
    }
}

/// Check that every required key is set
pub fn validate(settings: &InesSettings) -> IntegrationResult<()> {
    let missing: Vec<&str> = [
        ("compte", &settings.account),
        ("userName", &settings.username),
        ("password", &settings.password),
    ]
    .iter()
    .filter(|(_, value)| !is_valid_value(value))
    .map(|(key, _)| *key)
    .collect();

    if !missing.is_empty() {
        return Err(IntegrationError::Config(format!(
            "Ines credentials incomplete, missing: {}. Set them in the [ines] TOML section \
             or via {}, {} and {}",
            missing.join(", "),
            ACCOUNT_ENV_VAR,
            USERNAME_ENV_VAR,
            PASSWORD_ENV_VAR
        )));
    }

    if !settings.base_url.starts_with("http://") && !settings.base_url.starts_with("https://") {
        return Err(IntegrationError::Config(format!(
            "Ines base_url must be an http(s) URL: {}",
            settings.base_url
        )));
    }

    Ok(())
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}
