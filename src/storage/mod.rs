mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Cents, LedgerResult, NewAccount, TransferRequest};

/// SQL migration for the accounts table
pub const MIGRATION_001_ACCOUNTS: &str = include_str!("migrations/001_accounts.sql");

/// Persistence capability consumed by the ledger service.
///
/// Implementations are the only code allowed to mutate account records and
/// decide their own locking granularity. Every mutation is atomic: on error
/// nothing is written.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a new account with a fresh id and a zero balance.
    async fn create_account(&self, new: NewAccount) -> LedgerResult<Account>;

    /// All accounts, ordered by ascending id.
    async fn get_accounts(&self) -> LedgerResult<Vec<Account>>;

    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account>;

    /// Remove an account. Its id is never handed out again.
    async fn delete_account(&self, id: AccountId) -> LedgerResult<()>;

    /// Credit an account and return its new state.
    async fn deposit(&self, id: AccountId, amount: Cents) -> LedgerResult<Account>;

    /// Debit an account and return its new state. Fails if the balance would go negative.
    async fn withdraw(&self, id: AccountId, amount: Cents) -> LedgerResult<Account>;

    /// Move `amount` between two distinct accounts as a single atomic unit.
    async fn transfer(&self, request: TransferRequest) -> LedgerResult<()>;
}
