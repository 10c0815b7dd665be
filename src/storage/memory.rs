use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Account, AccountId, Cents, LedgerError, LedgerResult, NewAccount, TransferRequest,
    ensure_positive,
};

use super::Storage;

/// Account records indexed by id. Slot `id - 1` holds account `id`; a deleted
/// account leaves an empty slot behind so ids stay monotonic.
#[derive(Debug, Default)]
struct Arena {
    slots: Vec<Option<Account>>,
}

impl Arena {
    fn next_id(&self) -> AccountId {
        self.slots.len() as AccountId + 1
    }

    fn slot(id: AccountId) -> Option<usize> {
        usize::try_from(id).ok()?.checked_sub(1)
    }

    fn get(&self, id: AccountId) -> LedgerResult<&Account> {
        Self::slot(id)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
            .ok_or(LedgerError::NotFound(id))
    }

    fn get_mut(&mut self, id: AccountId) -> LedgerResult<&mut Account> {
        Self::slot(id)
            .and_then(|i| self.slots.get_mut(i))
            .and_then(Option::as_mut)
            .ok_or(LedgerError::NotFound(id))
    }

    fn put(&mut self, account: Account) {
        if let Some(slot) = Self::slot(account.id).and_then(|i| self.slots.get_mut(i)) {
            *slot = Some(account);
        }
    }
}

/// In-process storage guarded by a single store-wide lock.
///
/// Reads share the lock, mutations hold it exclusively, so readers never see a
/// transfer with only one leg applied. No mutation awaits while holding the
/// write guard: a cancelled caller either never acquired it or already finished.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    arena: RwLock<Arena>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_account(&self, new: NewAccount) -> LedgerResult<Account> {
        let mut arena = self.arena.write().await;
        let account = Account::open(arena.next_id(), new);
        arena.slots.push(Some(account.clone()));
        Ok(account)
    }

    async fn get_accounts(&self) -> LedgerResult<Vec<Account>> {
        let arena = self.arena.read().await;
        Ok(arena.slots.iter().flatten().cloned().collect())
    }

    async fn get_account_by_id(&self, id: AccountId) -> LedgerResult<Account> {
        let arena = self.arena.read().await;
        arena.get(id).cloned()
    }

    async fn delete_account(&self, id: AccountId) -> LedgerResult<()> {
        let mut arena = self.arena.write().await;
        arena.get(id)?;
        if let Some(slot) = Arena::slot(id).and_then(|i| arena.slots.get_mut(i)) {
            *slot = None;
        }
        Ok(())
    }

    async fn deposit(&self, id: AccountId, amount: Cents) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let mut arena = self.arena.write().await;
        let account = arena.get_mut(id)?;
        account.credit(amount)?;
        Ok(account.clone())
    }

    async fn withdraw(&self, id: AccountId, amount: Cents) -> LedgerResult<Account> {
        ensure_positive(amount)?;
        let mut arena = self.arena.write().await;
        let account = arena.get_mut(id)?;
        account.debit(amount)?;
        Ok(account.clone())
    }

    async fn transfer(&self, request: TransferRequest) -> LedgerResult<()> {
        request.validate()?;

        let mut arena = self.arena.write().await;

        // Existence is checked in lock order so the reported id is deterministic.
        let (low, high) = request.lock_order();
        arena.get(low)?;
        arena.get(high)?;

        // Work on copies and write both back only once both legs succeed.
        let mut source = arena.get(request.from_account_id)?.clone();
        let mut destination = arena.get(request.to_account_id)?.clone();
        source.debit(request.amount)?;
        destination.credit(request.amount)?;

        arena.put(source);
        arena.put(destination);
        Ok(())
    }
}
