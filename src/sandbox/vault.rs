// Sandbox yield vault
//
// Share price is total assets held by the vault over total shares issued,
// so a harvest (asset arriving without new shares) raises it. Supports a
// deposit limit and an emergency shutdown that blocks deposits.
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use crate::ports::backend::Backend;
use crate::quant::mul_div;
use crate::sandbox::ledger::{InMemoryLedger, LedgerState};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

pub struct SandboxVault {
    address: Address,
    asset: Address,
    name: String,
    mints_to_recipient: bool,
    ledger: Arc<InMemoryLedger>,
    deposit_limit: RwLock<Option<u128>>,
    shutdown: AtomicBool,
}

impl SandboxVault {
    pub fn deploy(
        ledger: Arc<InMemoryLedger>,
        address: Address,
        asset: Address,
        name: impl Into<String>,
        mints_to_recipient: bool,
    ) -> Result<Self, LedgerError> {
        let decimals = ledger.read(|s| Ok(s.book(&asset)?.decimals))?;
        ledger.create_book(address, decimals)?;
        Ok(Self {
            address,
            asset,
            name: name.into(),
            mints_to_recipient,
            ledger,
            deposit_limit: RwLock::new(None),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_deposit_limit(&self, limit: Option<u128>) {
        *self
            .deposit_limit
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = limit;
    }

    fn deposit_limit(&self) -> Option<u128> {
        *self
            .deposit_limit
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_emergency_shutdown(&self, active: bool) {
        self.shutdown.store(active, Ordering::SeqCst);
    }

    /// Simulated strategy profit: asset lands in the vault without new shares.
    pub fn harvest(&self, gain: u128) -> Result<(), LedgerError> {
        self.ledger.mint(&self.asset, &self.address, gain)?;
        debug!(vault = %self.name, gain = gain, "harvested");
        Ok(())
    }

    pub fn total_assets(&self) -> Result<u128, LedgerError> {
        self.ledger.balance(&self.asset, &self.address)
    }

    fn totals(&self, s: &LedgerState) -> Result<(u128, u128), LedgerError> {
        let total_assets = s.book(&self.asset)?.balance(&self.address);
        let supply = s.book(&self.address)?.total_supply;
        Ok((total_assets, supply))
    }
}

#[async_trait]
impl Backend for SandboxVault {
    fn address(&self) -> Address {
        self.address
    }

    fn asset(&self) -> Address {
        self.asset
    }

    fn mints_to_recipient(&self) -> bool {
        self.mints_to_recipient
    }

    async fn deposit(
        &self,
        caller: &Address,
        amount: u128,
        recipient: &Address,
    ) -> Result<u128, LedgerError> {
        if self.shutdown.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected(format!(
                "vault {} is in emergency shutdown",
                self.name
            )));
        }
        if !self.mints_to_recipient && recipient != caller {
            return Err(LedgerError::Rejected(format!(
                "vault {} only mints to the depositor",
                self.name
            )));
        }
        if amount == 0 {
            return Err(LedgerError::Rejected("deposit of zero".to_string()));
        }
        let limit = self.deposit_limit();

        self.ledger.apply(|s| {
            let (total_assets, supply) = self.totals(s)?;
            let room = limit.map_or(u128::MAX, |l| l.saturating_sub(total_assets));
            let take = amount.min(room);
            if take == 0 {
                return Err(LedgerError::Rejected(format!(
                    "vault {} deposit limit reached",
                    self.name
                )));
            }
            let shares = if supply == 0 || total_assets == 0 {
                take
            } else {
                mul_div(take, supply, total_assets).ok_or(LedgerError::Overflow)?
            };
            if shares == 0 {
                return Err(LedgerError::Rejected(
                    "deposit too small to mint a share".to_string(),
                ));
            }
            s.book_mut(&self.asset)?
                .transfer_from(&self.address, caller, &self.address, take)?;
            s.book_mut(&self.address)?.mint(recipient, shares)?;
            Ok(shares)
        })
    }

    async fn withdraw(
        &self,
        owner: &Address,
        shares: u128,
        recipient: &Address,
    ) -> Result<u128, LedgerError> {
        if shares == 0 {
            return Err(LedgerError::Rejected("withdrawal of zero shares".to_string()));
        }
        self.ledger.apply(|s| {
            let (total_assets, supply) = self.totals(s)?;
            s.book_mut(&self.address)?.burn(owner, shares)?;
            let value = mul_div(shares, total_assets, supply).ok_or(LedgerError::Overflow)?;
            s.book_mut(&self.asset)?
                .transfer(&self.address, recipient, value)?;
            Ok(value)
        })
    }

    async fn share_balance_of(&self, holder: &Address) -> Result<u128, LedgerError> {
        self.ledger.balance(&self.address, holder)
    }

    async fn share_allowance(
        &self,
        owner: &Address,
        spender: &Address,
    ) -> Result<u128, LedgerError> {
        self.ledger
            .read(|s| Ok(s.book(&self.address)?.allowance(owner, spender)))
    }

    async fn approve_shares(
        &self,
        caller: &Address,
        spender: &Address,
        shares: u128,
    ) -> Result<(), LedgerError> {
        self.ledger.apply(|s| {
            s.book_mut(&self.address)?.approve(caller, spender, shares);
            Ok(())
        })
    }

    async fn transfer_shares(
        &self,
        caller: &Address,
        to: &Address,
        shares: u128,
    ) -> Result<(), LedgerError> {
        self.ledger
            .apply(|s| s.book_mut(&self.address)?.transfer(caller, to, shares))
    }

    async fn shares_to_asset(&self, shares: u128) -> Result<u128, LedgerError> {
        self.ledger.read(|s| {
            let (total_assets, supply) = self.totals(s)?;
            if supply == 0 {
                return Ok(shares);
            }
            mul_div(shares, total_assets, supply).ok_or(LedgerError::Overflow)
        })
    }

    async fn asset_decimals(&self) -> Result<u8, LedgerError> {
        self.ledger.read(|s| Ok(s.book(&self.asset)?.decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::asset::Asset;
    use crate::sandbox::token::SandboxToken;

    fn setup(mints_to_recipient: bool) -> (SandboxToken, SandboxVault, Address) {
        let ledger = Arc::new(InMemoryLedger::new());
        let token =
            SandboxToken::deploy(ledger.clone(), Address::derive("token"), "TKN", 18).unwrap();
        let vault = SandboxVault::deploy(
            ledger,
            Address::derive("vault"),
            token.address(),
            "yvTKN",
            mints_to_recipient,
        )
        .unwrap();
        let alice = Address::derive("alice");
        token.mint(&alice, 10_000).unwrap();
        (token, vault, alice)
    }

    #[tokio::test]
    async fn first_deposit_is_one_to_one_then_price_follows_harvest() {
        let (token, vault, alice) = setup(true);
        token.approve(&alice, &vault.address(), 10_000).await.unwrap();
        let shares = vault.deposit(&alice, 4_000, &alice).await.unwrap();
        assert_eq!(shares, 4_000);

        vault.harvest(2_000).unwrap();
        // 6000 assets / 4000 shares
        assert_eq!(vault.shares_to_asset(1_000).await.unwrap(), 1_500);
        let shares = vault.deposit(&alice, 3_000, &alice).await.unwrap();
        assert_eq!(shares, 2_000);

        let paid = vault.withdraw(&alice, 6_000, &alice).await.unwrap();
        assert_eq!(paid, 9_000);
        assert_eq!(token.balance_of(&alice).await.unwrap(), 12_000);
    }

    #[tokio::test]
    async fn deposit_limit_caps_consumption() {
        let (token, vault, alice) = setup(true);
        vault.set_deposit_limit(Some(2_500));
        token.approve(&alice, &vault.address(), 10_000).await.unwrap();
        let shares = vault.deposit(&alice, 4_000, &alice).await.unwrap();
        assert_eq!(shares, 2_500);
        assert_eq!(token.balance_of(&alice).await.unwrap(), 7_500);
        assert!(vault.deposit(&alice, 1, &alice).await.is_err());
    }

    #[tokio::test]
    async fn shutdown_and_recipient_rules() {
        let (token, vault, alice) = setup(false);
        let bob = Address::derive("bob");
        token.approve(&alice, &vault.address(), 10_000).await.unwrap();
        assert!(vault.deposit(&alice, 100, &bob).await.is_err());

        vault.set_emergency_shutdown(true);
        assert!(vault.deposit(&alice, 100, &alice).await.is_err());
        assert_eq!(token.balance_of(&alice).await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn withdraw_more_than_held_fails_cleanly() {
        let (token, vault, alice) = setup(true);
        token.approve(&alice, &vault.address(), 10_000).await.unwrap();
        vault.deposit(&alice, 1_000, &alice).await.unwrap();
        let err = vault.withdraw(&alice, 1_001, &alice).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(vault.share_balance_of(&alice).await.unwrap(), 1_000);
    }
}
