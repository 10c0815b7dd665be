use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, LedgerError, LedgerResult};

/// Assigned by storage, never reused after deletion.
pub type AccountId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    /// Minor currency units, never negative at rest.
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Materialize a freshly created account with a zero balance.
    pub fn open(id: AccountId, new: NewAccount) -> Self {
        Self {
            id,
            first_name: new.first_name,
            last_name: new.last_name,
            balance: 0,
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns true if debiting `amount` keeps the balance non-negative.
    pub fn can_debit(&self, amount: Cents) -> bool {
        self.balance >= amount
    }

    /// Subtract `amount`, rejecting overdrafts. Leaves the account untouched on error.
    pub fn debit(&mut self, amount: Cents) -> LedgerResult<()> {
        if !self.can_debit(amount) {
            return Err(LedgerError::InsufficientFunds {
                account_id: self.id,
                balance: self.balance,
                required: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `amount`. Leaves the account untouched on overflow.
    pub fn credit(&mut self, amount: Cents) -> LedgerResult<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid(format!("Balance overflow on account {}", self.id)))?;
        Ok(())
    }
}

/// Validated input for account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
}

impl NewAccount {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> LedgerResult<Self> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();

        if first_name.is_empty() {
            return Err(LedgerError::invalid("First name must not be empty"));
        }
        if last_name.is_empty() {
            return Err(LedgerError::invalid("Last name must not be empty"));
        }

        Ok(Self {
            first_name,
            last_name,
        })
    }
}
