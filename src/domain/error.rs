use thiserror::Error;

use super::{AccountId, Cents};

/// Every failure the ledger can report. Storage backends and the service
/// return these unchanged; mapping to transport status codes happens at the edge.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Account not found: {0}")]
    NotFound(AccountId),

    #[error("Insufficient funds in account {account_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        required: Cents,
    },

    /// Reserved for uniqueness constraints beyond the account id.
    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidArgument(msg.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Reject zero and negative amounts.
pub fn ensure_positive(amount: Cents) -> LedgerResult<()> {
    if amount <= 0 {
        return Err(LedgerError::invalid("Amount must be positive"));
    }
    Ok(())
}
