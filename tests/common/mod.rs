// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use ledgerd::Storage;
use ledgerd::application::{LedgerConfig, LedgerService};
use ledgerd::domain::{Account, Cents};
use ledgerd::storage::{MemoryStorage, SqliteStorage};
use tempfile::TempDir;

/// Helper to create a service over fresh in-memory storage
pub fn memory_service() -> LedgerService<MemoryStorage> {
    LedgerService::new(Arc::new(MemoryStorage::new()))
}

/// Helper to create a test service with a temporary database
pub async fn sqlite_service() -> Result<(LedgerService<SqliteStorage>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::<SqliteStorage>::init(
        db_path.to_str().unwrap(),
        LedgerConfig::default(),
    )
    .await?;
    Ok((service, temp_dir))
}

pub async fn balance_of<S: Storage + ?Sized>(
    service: &LedgerService<S>,
    account: &Account,
) -> Result<Cents> {
    Ok(service.get_account(account.id).await?.balance)
}

/// Test fixture: two named accounts
pub struct StandardAccounts;

impl StandardAccounts {
    /// Create Alice and Bob, both with a zero balance
    pub async fn create_pair<S: Storage + ?Sized>(
        service: &LedgerService<S>,
    ) -> Result<(Account, Account)> {
        let alice = service.create_account("Alice", "Smith").await?;
        let bob = service.create_account("Bob", "Jones").await?;
        Ok((alice, bob))
    }

    /// Create Alice and Bob and credit Alice with `amount`
    pub async fn create_funded_pair<S: Storage + ?Sized>(
        service: &LedgerService<S>,
        amount: Cents,
    ) -> Result<(Account, Account)> {
        let (alice, bob) = Self::create_pair(service).await?;
        service.deposit(alice.id, amount).await?;
        Ok((alice, bob))
    }
}
