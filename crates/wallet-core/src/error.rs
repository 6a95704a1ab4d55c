use thiserror::Error;
use wallet_domain::{AccountId, TransactionId};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),
    #[error("Transaction already recorded: {0}")]
    DuplicateTransaction(TransactionId),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
