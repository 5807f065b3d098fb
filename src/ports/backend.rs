// Yield-bearing storage backend interface
// A backend issues shares for deposited asset and redeems shares back to
// asset at its own live conversion rate
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a backend as returned by a directory.
pub type BackendRef = Arc<dyn Backend>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Address of the backend; also the address of its share book.
    fn address(&self) -> Address;

    /// Asset this backend accepts.
    fn asset(&self) -> Address;

    /// Whether `deposit` can mint shares straight to a third-party recipient.
    /// When false, shares are always minted to the caller.
    fn mints_to_recipient(&self) -> bool;

    /// Pull `amount` of asset from `caller` (spending the allowance `caller`
    /// granted this backend) and mint shares to `recipient`. Returns shares
    /// issued. The backend may consume less than `amount`, e.g. when a deposit
    /// limit is reached; the unconsumed asset stays with `caller`.
    async fn deposit(
        &self,
        caller: &Address,
        amount: u128,
        recipient: &Address,
    ) -> Result<u128, LedgerError>;

    /// Burn `shares` held by `owner` and pay the redeemed asset to `recipient`.
    /// The call itself is `owner`'s authorization; no share allowance is
    /// consulted. Returns the asset amount paid.
    async fn withdraw(
        &self,
        owner: &Address,
        shares: u128,
        recipient: &Address,
    ) -> Result<u128, LedgerError>;

    async fn share_balance_of(&self, holder: &Address) -> Result<u128, LedgerError>;

    async fn share_allowance(&self, owner: &Address, spender: &Address)
        -> Result<u128, LedgerError>;

    async fn approve_shares(
        &self,
        caller: &Address,
        spender: &Address,
        shares: u128,
    ) -> Result<(), LedgerError>;

    async fn transfer_shares(
        &self,
        caller: &Address,
        to: &Address,
        shares: u128,
    ) -> Result<(), LedgerError>;

    /// Asset value of `shares` at the current rate (rounded down).
    async fn shares_to_asset(&self, shares: u128) -> Result<u128, LedgerError>;

    async fn asset_decimals(&self) -> Result<u8, LedgerError>;
}
