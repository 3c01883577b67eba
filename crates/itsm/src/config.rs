//! Configuration file loading and parsing.
//!
//! The tracker reads repository-level configuration from `config.toml` in
//! the data directory. If no config file exists, the system falls back to
//! sensible defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::mailgate::MailStrictness;

/// Root configuration structure loaded from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ItsmConfig {
    /// Mail gateway configuration (optional).
    pub mail: Option<MailConfig>,
}

/// Mail gateway behavior configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MailConfig {
    /// Strictness for rejected directives: "drop" or "bounce" (default: "drop").
    pub strictness: Option<String>,
}

impl MailConfig {
    /// Get the strictness mode, defaulting to Drop if not specified.
    pub fn strictness_mode(&self) -> Result<MailStrictness> {
        match self.strictness.as_deref() {
            None => Ok(MailStrictness::default()),
            Some(token) => MailStrictness::parse(token).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid mail strictness: '{}'. Valid options: 'drop', 'bounce'",
                    token
                )
            }),
        }
    }
}

impl ItsmConfig {
    /// Load configuration from `config.toml` in the data directory, if it exists.
    ///
    /// Returns an empty config (all fields None) if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(data_root: &Path) -> Result<Self> {
        let config_path = data_root.join("config.toml");

        if !config_path.exists() {
            // No config file - return empty config (will use defaults)
            return Ok(ItsmConfig { mail: None });
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config.toml")?;

        let config: ItsmConfig = toml::from_str(&content).context("Failed to parse config.toml")?;

        Ok(config)
    }

    /// Get the effective mail strictness, defaulting to Drop when the
    /// `[mail]` section is absent.
    pub fn mail_strictness(&self) -> Result<MailStrictness> {
        match &self.mail {
            Some(mail) => mail.strictness_mode(),
            None => Ok(MailStrictness::default()),
        }
    }
}
