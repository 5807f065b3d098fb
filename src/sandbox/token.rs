// Sandbox fungible asset
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use crate::ports::asset::Asset;
use crate::sandbox::ledger::InMemoryLedger;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone)]
pub struct SandboxToken {
    address: Address,
    symbol: String,
    decimals: u8,
    ledger: Arc<InMemoryLedger>,
}

impl SandboxToken {
    pub fn deploy(
        ledger: Arc<InMemoryLedger>,
        address: Address,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> Result<Self, LedgerError> {
        ledger.create_book(address, decimals)?;
        Ok(Self {
            address,
            symbol: symbol.into(),
            decimals,
            ledger,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Faucet used by world setup and tests.
    pub fn mint(&self, to: &Address, amount: u128) -> Result<(), LedgerError> {
        self.ledger.mint(&self.address, to, amount)
    }
}

#[async_trait]
impl Asset for SandboxToken {
    fn address(&self) -> Address {
        self.address
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    async fn balance_of(&self, holder: &Address) -> Result<u128, LedgerError> {
        self.ledger.balance(&self.address, holder)
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> Result<u128, LedgerError> {
        self.ledger
            .read(|s| Ok(s.book(&self.address)?.allowance(owner, spender)))
    }

    async fn approve(
        &self,
        caller: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.ledger.apply(|s| {
            s.book_mut(&self.address)?.approve(caller, spender, amount);
            Ok(())
        })
    }

    async fn transfer(
        &self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.ledger
            .apply(|s| s.book_mut(&self.address)?.transfer(caller, to, amount))
    }

    async fn transfer_from(
        &self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), LedgerError> {
        self.ledger.apply(|s| {
            s.book_mut(&self.address)?
                .transfer_from(caller, from, to, amount)
        })
    }
}
