use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use crate::transfer::coordinator::WizardConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
    /// Decimal string, e.g. "500000.00"
    pub transfer_limit: String,
    pub max_credential_attempts: u32,
    pub passcode_ttl_secs: u64,
    pub email_endpoint: Option<String>,
    pub email_api_key: Option<String>,
}

impl AppConfig {
    /// Wizard tunables derived from this config
    pub fn wizard_config(&self) -> Result<WizardConfig, ConfigError> {
        let transfer_limit: Decimal = self
            .transfer_limit
            .trim()
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid transfer_limit {:?}: {}", self.transfer_limit, e)))?;
        if transfer_limit <= Decimal::ZERO {
            return Err(ConfigError::Message("transfer_limit must be positive".to_string()));
        }
        if self.max_credential_attempts == 0 {
            return Err(ConfigError::Message("max_credential_attempts must be at least 1".to_string()));
        }
        if self.passcode_ttl_secs == 0 {
            return Err(ConfigError::Message("passcode_ttl_secs must be at least 1".to_string()));
        }

        Ok(WizardConfig {
            transfer_limit,
            max_credential_attempts: self.max_credential_attempts,
            passcode_ttl: Duration::from_secs(self.passcode_ttl_secs),
        })
    }
}

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
        // Set defaults
        .set_default("log_level", "info")?
        .set_default("log_to_file", false)?
        .set_default("log_file", "log/transfer_gate.log")?
        .set_default("transfer_limit", "500000.00")?
        .set_default("max_credential_attempts", 3)?
        .set_default("passcode_ttl_secs", 180)
}

pub fn load_config() -> Result<AppConfig, ConfigError> {
    let s = builder()?
        // Add configuration from a file
        .add_source(File::with_name("config/config.yaml").required(false))
        // Add configuration from environment variables
        .add_source(Environment::with_prefix("WIZARD"))
        .build()?;

    s.try_deserialize()
}
