use serde::{Deserialize, Serialize};

use super::{AccountId, Cents, LedgerError, LedgerResult, ensure_positive};

/// A request to move money from one account to another.
/// Not persisted; only its effect on the two balances is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Source account (balance decreases)
    pub from_account_id: AccountId,
    /// Destination account (balance increases)
    pub to_account_id: AccountId,
    /// Amount in cents (always positive)
    pub amount: Cents,
}

impl TransferRequest {
    pub fn new(from_account_id: AccountId, to_account_id: AccountId, amount: Cents) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }

    /// Check the request without looking at any account state.
    pub fn validate(&self) -> LedgerResult<()> {
        ensure_positive(self.amount)?;
        if self.from_account_id == self.to_account_id {
            return Err(LedgerError::invalid(format!(
                "Cannot transfer from account {} to itself",
                self.from_account_id
            )));
        }
        Ok(())
    }

    /// The two account ids in the order locks must be taken.
    pub fn lock_order(&self) -> (AccountId, AccountId) {
        if self.from_account_id < self.to_account_id {
            (self.from_account_id, self.to_account_id)
        } else {
            (self.to_account_id, self.from_account_id)
        }
    }
}
