use std::result::Result as StdResult;

use thiserror::Error;
use wallet_config::ConfigError;
use wallet_core::CoreError;

/// Unified error type surfaced by the facade and the simulation binary.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = StdResult<T, WalletError>;

impl WalletError {
    /// True for errors caused by the caller's input rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            WalletError::Core(CoreError::Validation(_))
                | WalletError::Json(_)
                | WalletError::InvalidInput(_)
        )
    }
}
