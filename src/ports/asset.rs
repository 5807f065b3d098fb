// Fungible asset accessor
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use async_trait::async_trait;

/// Standard fungible-asset primitives for the routed asset.
///
/// There is no ambient "message sender": every mutating call names the
/// principal performing it, and the host vouches for that principal.
#[async_trait]
pub trait Asset: Send + Sync {
    /// Address of the asset; directories key their backend lists by it.
    fn address(&self) -> Address;

    fn decimals(&self) -> u8;

    async fn balance_of(&self, holder: &Address) -> Result<u128, LedgerError>;

    async fn allowance(&self, owner: &Address, spender: &Address) -> Result<u128, LedgerError>;

    async fn approve(
        &self,
        caller: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;

    async fn transfer(&self, caller: &Address, to: &Address, amount: u128)
        -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`, spending `caller`'s allowance on `from`.
    async fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError>;
}
