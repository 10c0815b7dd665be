use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::domain::{
    Account, AccountId, Cents, LedgerError, LedgerResult, NewAccount, TransferRequest,
    ensure_positive,
};

use super::{MIGRATION_001_ACCOUNTS, Storage};

const ACCOUNT_COLUMNS: &str = "id, first_name, last_name, balance, created_at";

/// Durable storage on a SQLite database.
///
/// Every mutation runs inside a transaction whose first statement is a write,
/// so concurrent writers queue on SQLite's busy handler instead of failing on
/// a lock upgrade. A transaction dropped before commit (e.g. a timed-out
/// caller) is rolled back.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new storage with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(MIGRATION_001_ACCOUNTS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate).
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let storage = Self::connect(database_url).await?;
        storage.migrate().await?;
        Ok(storage)
    }

    async fn fetch_balance(conn: &mut SqliteConnection, id: AccountId) -> LedgerResult<Cents> {
        let row = sqlx::query("SELECT balance FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to fetch balance")?;

        row.map(|r| r.get::<Cents, _>("balance"))
            .ok_or(LedgerError::NotFound(id))
    }

    /// Debit within an open transaction. On failure, reports why nothing was updated.
    async fn debit(conn: &mut SqliteConnection, id: AccountId, amount: Cents) -> LedgerResult<()> {
        let updated = sqlx::query(
            "UPDATE accounts SET balance = balance - ? WHERE id = ? AND balance >= ?",
        )
        .bind(amount)
        .bind(id)
        .bind(amount)
        .execute(&mut *conn)
        .await
        .context("Failed to debit account")?
        .rows_affected();

        if updated == 0 {
            let balance = Self::fetch_balance(conn, id).await?;
            return Err(LedgerError::InsufficientFunds {
                account_id: id,
                balance,
                required: amount,
            });
        }
        Ok(())
    }

    /// Credit within an open transaction, refusing to overflow the balance.
    async fn credit(conn: &mut SqliteConnection, id: AccountId, amount: Cents) -> LedgerResult<()> {
        let updated = sqlx::query(
            "UPDATE accounts SET balance = balance + ? WHERE id = ? AND balance <= ?",
        )
        .bind(amount)
        .bind(id)
        .bind(Cents::MAX - amount)
        .execute(&mut *conn)
        .await
        .context("Failed to credit account")?
        .rows_affected();

        if updated == 0 {
            Self::fetch_balance(conn, id).await?;
            return Err(LedgerError::invalid(format!("Balance overflow on account {id}")));
        }
        Ok(())
    }

    async fn fetch_account(conn: &mut SqliteConnection, id: AccountId) -> LedgerResult<Account> {
        let row = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
            .bind(id)
            .fetch_optional(conn)
            .await
            .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Self::row_to_account(&row)?),
            None => Err(LedgerError::NotFound(id)),
        }
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<Account> {
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: row.get("id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            balance: row.get("balance"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_account(&self, new: NewAccount) -> LedgerResult<Account> {
        let created_at = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO accounts (first_name, last_name, balance, created_at)
            VALUES (?, ?, 0, ?)
            RETURNING id
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(created_at.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .context("Failed to save account")?;

        Ok(Account {
            id: row.get("id"),
            first_name: new.first_name,
            last_name: new.last_name,
            balance: 0,
            created_at,
        })
    }

    async fn get_accounts(&self) -> LedgerResult<Vec<Account>> {
        let rows = sqlx::query(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        Ok(rows
            .iter()
            .map(Self::row_to_account)
            .collect::<anyhow::Result<Vec<_>>>()?)
    }

    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        Self::fetch_account(&mut conn, id).await
    }

    async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        let deleted = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?
            .rows_affected();

        if deleted == 0 {
            return Err(LedgerError::NotFound(id));
        }
        Ok(())
    }

    async fn deposit(&self, id: AccountId, amount: Cents) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::credit(&mut tx, id, amount).await?;
        let account = Self::fetch_account(&mut tx, id).await?;
        tx.commit().await.context("Failed to commit deposit")?;
        Ok(account)
    }

    async fn withdraw(&self, id: AccountId, amount: Cents) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        Self::debit(&mut tx, id, amount).await?;
        let account = Self::fetch_account(&mut tx, id).await?;
        tx.commit().await.context("Failed to commit withdrawal")?;
        Ok(account)
    }

    async fn transfer(&self, request: TransferRequest) -> LedgerResult<()> {
        request.validate()?;

        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        // A no-op write on both rows, in ascending id order, takes the write
        // lock up front and doubles as the existence check.
        let (low, high) = request.lock_order();
        for id in [low, high] {
            let touched = sqlx::query("UPDATE accounts SET balance = balance WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to lock account")?
                .rows_affected();
            if touched == 0 {
                return Err(LedgerError::NotFound(id));
            }
        }

        Self::debit(&mut tx, request.from_account_id, request.amount).await?;
        Self::credit(&mut tx, request.to_account_id, request.amount).await?;

        tx.commit().await.context("Failed to commit transfer")?;
        Ok(())
    }
}
