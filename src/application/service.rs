use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{
    Account, AccountId, Cents, LedgerError, LedgerResult, NewAccount, TransferRequest,
    ensure_positive,
};
use crate::storage::{SqliteStorage, Storage};

use super::LedgerConfig;

/// Application service providing the ledger operations.
/// This is the primary interface for any client (CLI, HTTP, tests).
///
/// Holds no state besides the injected storage handle, so clones are cheap
/// and can be shared across tasks.
pub struct LedgerService<S: Storage + ?Sized> {
    storage: Arc<S>,
    config: LedgerConfig,
}

impl<S: Storage + ?Sized> Clone for LedgerService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: self.config,
        }
    }
}

impl LedgerService<SqliteStorage> {
    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str, config: LedgerConfig) -> LedgerResult<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let storage = SqliteStorage::init(&db_url).await?;
        Ok(Self::with_config(Arc::new(storage), config))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: LedgerConfig) -> LedgerResult<Self> {
        let db_url = format!("sqlite:{}", database_path);
        let storage = SqliteStorage::connect(&db_url).await?;
        Ok(Self::with_config(Arc::new(storage), config))
    }
}

impl<S: Storage + ?Sized> LedgerService<S> {
    /// Create a new ledger service over the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self::with_config(storage, LedgerConfig::default())
    }

    pub fn with_config(storage: Arc<S>, config: LedgerConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> LedgerConfig {
        self.config
    }

    /// Erase the storage type, e.g. to hand the service to the HTTP router.
    pub fn into_dyn(self) -> LedgerService<dyn Storage>
    where
        S: Sized + 'static,
    {
        let storage: Arc<dyn Storage> = self.storage;
        LedgerService::with_config(storage, self.config)
    }

    /// Await a storage call, bounded by the configured timeout.
    async fn bounded<T>(&self, op: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
        match self.config.operation_timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .map_err(|_| LedgerError::Timeout)?,
            None => op.await,
        }
    }

    // ========================
    // Account operations
    // ========================

    /// Create a new account with a zero balance.
    pub async fn create_account(
        &self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> LedgerResult<Account> {
        let new = NewAccount::new(first_name, last_name)?;
        let account = self.bounded(self.storage.create_account(new)).await?;
        info!(account_id = account.id, "account created");
        Ok(account)
    }

    /// List all accounts in ascending id order.
    pub async fn get_accounts(&self) -> LedgerResult<Vec<Account>> {
        let accounts = self.bounded(self.storage.get_accounts()).await?;
        debug!(count = accounts.len(), "accounts listed");
        Ok(accounts)
    }

    /// Get an account by id.
    pub async fn get_account(&self, id: AccountId) -> LedgerResult<Account> {
        debug!(account_id = id, "fetching account");
        self.bounded(self.storage.get_account_by_id(id)).await
    }

    /// Delete an account.
    pub async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        self.bounded(self.storage.delete_account(id)).await?;
        info!(account_id = id, "account deleted");
        Ok(())
    }

    // ========================
    // Balance operations
    // ========================

    /// Credit an account.
    pub async fn deposit(&self, id: AccountId, amount: Cents) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let account = self.bounded(self.storage.deposit(id, amount)).await?;
        info!(account_id = id, amount, balance = account.balance, "deposit applied");
        Ok(account)
    }

    /// Debit an account without letting it go negative.
    pub async fn withdraw(&self, id: AccountId, amount: Cents) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let account = self.bounded(self.storage.withdraw(id, amount)).await?;
        info!(account_id = id, amount, balance = account.balance, "withdrawal applied");
        Ok(account)
    }

    /// Move money between two accounts. Either both balances change or neither does.
    pub async fn transfer(&self, request: TransferRequest) -> LedgerResult<()> {
        request.validate()?;

        match self.bounded(self.storage.transfer(request)).await {
            Ok(()) => {
                info!(
                    from = request.from_account_id,
                    to = request.to_account_id,
                    amount = request.amount,
                    "transfer applied"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    from = request.from_account_id,
                    to = request.to_account_id,
                    amount = request.amount,
                    error = %err,
                    "transfer rejected"
                );
                Err(err)
            }
        }
    }
}
