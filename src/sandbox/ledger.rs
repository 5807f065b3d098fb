// In-memory ledger backing every sandbox collaborator
//
// Holds one fungible book per asset and per backend share class, and a
// journal of snapshots so a whole router operation can be rolled back.
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use crate::ports::host::{Snapshot, TransactionHost};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// One fungible balance sheet.
#[derive(Debug, Clone, Default)]
pub struct Book {
    pub decimals: u8,
    pub total_supply: u128,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
}

impl Book {
    pub fn balance(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    pub fn mint(&mut self, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let bal = self.balances.entry(*to).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    pub fn burn(&mut self, from: &Address, amount: u128) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.debit(from, amount)?;
        let bal = self.balances.entry(*to).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Transfer spending `spender`'s allowance on `from`. An unlimited
    /// (`u128::MAX`) allowance is never decremented.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: *from,
                spender: *spender,
                required: amount,
                available: allowed,
            });
        }
        self.transfer(from, to, amount)?;
        if allowed != u128::MAX {
            self.approve(from, spender, allowed - amount);
        }
        Ok(())
    }

    fn debit(&mut self, from: &Address, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance(from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account: *from,
                required: amount,
                available,
            });
        }
        self.balances.insert(*from, available - amount);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    books: HashMap<Address, Book>,
}

impl LedgerState {
    pub fn book(&self, id: &Address) -> Result<&Book, LedgerError> {
        self.books.get(id).ok_or(LedgerError::UnknownAccount(*id))
    }

    pub fn book_mut(&mut self, id: &Address) -> Result<&mut Book, LedgerError> {
        self.books
            .get_mut(id)
            .ok_or(LedgerError::UnknownAccount(*id))
    }
}

/// Shared world state for sandbox assets and vaults.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    journal: Mutex<Vec<(Snapshot, LedgerState)>>,
    next_snapshot: AtomicU64,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn journal(&self) -> MutexGuard<'_, Vec<(Snapshot, LedgerState)>> {
        self.journal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create_book(&self, id: Address, decimals: u8) -> Result<(), LedgerError> {
        let mut state = self.state();
        if state.books.contains_key(&id) {
            return Err(LedgerError::Rejected(format!("book {id} already exists")));
        }
        state.books.insert(
            id,
            Book {
                decimals,
                ..Book::default()
            },
        );
        Ok(())
    }

    /// Read-only view of the state.
    pub fn read<T>(
        &self,
        f: impl FnOnce(&LedgerState) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        f(&self.state())
    }

    /// Apply `f` to a draft of the state and keep the draft only if `f`
    /// succeeds, so every collaborator call is all-or-nothing on its own.
    pub fn apply<T>(
        &self,
        f: impl FnOnce(&mut LedgerState) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut state = self.state();
        let mut draft = state.clone();
        let out = f(&mut draft)?;
        *state = draft;
        Ok(out)
    }

    pub fn balance(&self, book: &Address, holder: &Address) -> Result<u128, LedgerError> {
        self.read(|s| Ok(s.book(book)?.balance(holder)))
    }

    pub fn total_supply(&self, book: &Address) -> Result<u128, LedgerError> {
        self.read(|s| Ok(s.book(book)?.total_supply))
    }

    pub fn mint(&self, book: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.apply(|s| s.book_mut(book)?.mint(to, amount))
    }

    pub fn burn(&self, book: &Address, from: &Address, amount: u128) -> Result<(), LedgerError> {
        self.apply(|s| s.book_mut(book)?.burn(from, amount))
    }

    pub fn open_snapshots(&self) -> usize {
        self.journal().len()
    }
}

#[async_trait]
impl TransactionHost for InMemoryLedger {
    async fn snapshot(&self) -> Result<Snapshot, LedgerError> {
        let id = Snapshot(self.next_snapshot.fetch_add(1, Ordering::Relaxed));
        let copy = self.state().clone();
        self.journal().push((id, copy));
        debug!(snapshot = id.0, "ledger snapshot taken");
        Ok(id)
    }

    async fn commit(&self, snapshot: Snapshot) -> Result<(), LedgerError> {
        let mut journal = self.journal();
        let pos = journal
            .iter()
            .position(|(id, _)| *id == snapshot)
            .ok_or_else(|| LedgerError::Host(format!("unknown snapshot {}", snapshot.0)))?;
        journal.truncate(pos);
        Ok(())
    }

    async fn revert(&self, snapshot: Snapshot) -> Result<(), LedgerError> {
        // state before journal, matching `snapshot`
        let mut state = self.state();
        let mut journal = self.journal();
        let pos = journal
            .iter()
            .position(|(id, _)| *id == snapshot)
            .ok_or_else(|| LedgerError::Host(format!("unknown snapshot {}", snapshot.0)))?;
        if let Some((_, saved)) = journal.split_off(pos).into_iter().next() {
            *state = saved;
        }
        debug!(snapshot = snapshot.0, "ledger reverted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (InMemoryLedger, Address, Address, Address) {
        let ledger = InMemoryLedger::new();
        let token = Address::derive("token");
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        ledger.create_book(token, 18).unwrap();
        ledger.mint(&token, &alice, 1_000).unwrap();
        (ledger, token, alice, bob)
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let (ledger, token, alice, bob) = setup();
        ledger
            .apply(|s| {
                let book = s.book_mut(&token)?;
                book.approve(&alice, &bob, 300);
                book.transfer_from(&bob, &alice, &bob, 200)
            })
            .unwrap();
        ledger
            .read(|s| {
                let book = s.book(&token)?;
                assert_eq!(book.balance(&alice), 800);
                assert_eq!(book.balance(&bob), 200);
                assert_eq!(book.allowance(&alice, &bob), 100);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn unlimited_allowance_is_not_decremented() {
        let (ledger, token, alice, bob) = setup();
        ledger
            .apply(|s| {
                let book = s.book_mut(&token)?;
                book.approve(&alice, &bob, u128::MAX);
                book.transfer_from(&bob, &alice, &bob, 500)
            })
            .unwrap();
        let allowance = ledger
            .read(|s| Ok(s.book(&token)?.allowance(&alice, &bob)))
            .unwrap();
        assert_eq!(allowance, u128::MAX);
    }

    #[test]
    fn failed_apply_leaves_state_untouched() {
        let (ledger, token, alice, bob) = setup();
        let err = ledger
            .apply(|s| {
                let book = s.book_mut(&token)?;
                book.transfer(&alice, &bob, 600)?;
                book.transfer(&alice, &bob, 600)
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance(&token, &alice).unwrap(), 1_000);
        assert_eq!(ledger.balance(&token, &bob).unwrap(), 0);
    }

    #[tokio::test]
    async fn revert_restores_and_drops_inner_snapshots() {
        let (ledger, token, alice, bob) = setup();
        let outer = ledger.snapshot().await.unwrap();
        ledger
            .apply(|s| s.book_mut(&token)?.transfer(&alice, &bob, 100))
            .unwrap();
        let _inner = ledger.snapshot().await.unwrap();
        ledger.burn(&token, &alice, 100).unwrap();
        assert_eq!(ledger.open_snapshots(), 2);

        ledger.revert(outer).await.unwrap();
        assert_eq!(ledger.open_snapshots(), 0);
        assert_eq!(ledger.balance(&token, &alice).unwrap(), 1_000);
        assert_eq!(ledger.total_supply(&token).unwrap(), 1_000);
    }

    #[tokio::test]
    async fn commit_keeps_changes() {
        let (ledger, token, alice, bob) = setup();
        let snap = ledger.snapshot().await.unwrap();
        ledger
            .apply(|s| s.book_mut(&token)?.transfer(&alice, &bob, 250))
            .unwrap();
        ledger.commit(snap).await.unwrap();
        assert_eq!(ledger.balance(&token, &bob).unwrap(), 250);
        assert!(ledger.commit(snap).await.is_err());
    }
}
