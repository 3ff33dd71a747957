use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::account::validation::validate_pin_format;
use crate::error::{Result, UssdError};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UssdConfig {
    pub session: SessionConfig,
    pub account: AccountConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Inactivity window before the session is killed
    pub timeout_ms: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AccountConfig {
    pub number: String,
    pub pin: String,
    pub opening_balance: Decimal,
    #[serde(default = "default_max_pin_attempts")]
    pub max_pin_attempts: u32,
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_max_pin_attempts() -> u32 {
    3
}

impl Default for UssdConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                timeout_ms: 5 * 60 * 1000,
                tick_ms: default_tick_ms(),
            },
            account: AccountConfig {
                number: "0340000000".to_string(),
                pin: "1234".to_string(),
                opening_balance: Decimal::from(1_000_000),
                max_pin_attempts: default_max_pin_attempts(),
            },
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl UssdConfig {
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: UssdConfig = toml::from_str(s).map_err(|e| UssdError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session.timeout_ms == 0 {
            return Err(UssdError::Config("session.timeout_ms must be > 0".to_string()));
        }
        if self.session.tick_ms == 0 {
            return Err(UssdError::Config("session.tick_ms must be > 0".to_string()));
        }
        if self.account.opening_balance.is_sign_negative() {
            return Err(UssdError::Config("account.opening_balance must not be negative".to_string()));
        }
        validate_pin_format(&self.account.pin)
            .map_err(|_| UssdError::Config("account.pin must be 4 digits".to_string()))?;
        if self.account.max_pin_attempts == 0 {
            return Err(UssdError::Config("account.max_pin_attempts must be > 0".to_string()));
        }
        Ok(())
    }

    /// Reads `path` if it exists; any problem falls back to the defaults.
    pub fn load_or_default(path: &str) -> Self {
        if !std::path::Path::new(path).exists() {
            info!("Config file not found at '{}'. Using defaults.", path);
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(s) => match Self::from_toml(&s) {
                Ok(c) => {
                    info!("Config loaded from {}", path);
                    c
                }
                Err(e) => {
                    warn!("Error parsing config: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Error reading config: {}. Using defaults.", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UssdConfig::default();
        assert_eq!(config.session.timeout(), Duration::from_secs(300));
        assert_eq!(config.session.tick(), Duration::from_secs(1));
        assert_eq!(config.account.max_pin_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_with_optional_fields_missing() {
        let raw = r#"
            [session]
            timeout_ms = 5000

            [account]
            number = "130103"
            pin = "4321"
            opening_balance = "2500"
        "#;
        let config = UssdConfig::from_toml(raw).unwrap();
        assert_eq!(config.session.timeout_ms, 5000);
        assert_eq!(config.session.tick_ms, 1000);
        assert_eq!(config.account.number, "130103");
        assert_eq!(config.account.opening_balance, Decimal::from(2500));
        assert_eq!(config.account.max_pin_attempts, 3);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let raw = r#"
            [session]
            timeout_ms = 0

            [account]
            number = "130103"
            pin = "4321"
            opening_balance = "0"
        "#;
        assert!(matches!(UssdConfig::from_toml(raw), Err(UssdError::Config(_))));
    }

    #[test]
    fn test_rejects_malformed_pin() {
        let mut config = UssdConfig::default();
        config.account.pin = "12a4".to_string();
        assert!(matches!(config.validate(), Err(UssdError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = UssdConfig::load_or_default("/nonexistent/ussd.toml");
        assert_eq!(config, UssdConfig::default());
    }
}
