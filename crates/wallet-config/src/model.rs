use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// User-level settings shared by the service facade and the simulation binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    /// Extra `tracing` filter directive layered over the built-in default,
    /// e.g. `wallet_core=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_directive: Option<String>,
    /// Monthly amount above the minimums used when a payoff plan is requested
    /// without an explicit extra payment.
    #[serde(default)]
    pub default_extra_payment: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_wallet: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "USD".into(),
            log_directive: None,
            default_extra_payment: Decimal::ZERO,
            last_opened_wallet: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("currency must not be empty".into()));
        }
        if self.default_extra_payment < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "default_extra_payment must not be negative, got {}",
                self.default_extra_payment
            )));
        }
        Ok(())
    }
}
