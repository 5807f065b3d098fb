//! Shared fixture for router integration tests: one asset, one directory
//! governed by the router owner, and helpers to deploy vaults and fund users.

#![allow(dead_code)]

use std::sync::Arc;

use vault_router::address::Address;
use vault_router::ports::{Asset, Backend, Directory, TransactionHost};
use vault_router::router::Router;
use vault_router::sandbox::{InMemoryLedger, SandboxRegistry, SandboxToken, SandboxVault};

pub const UNIT: u128 = 1_000_000_000_000_000_000;

pub struct Fixture {
    pub ledger: Arc<InMemoryLedger>,
    pub token: Arc<SandboxToken>,
    pub registry: Arc<SandboxRegistry>,
    pub router: Arc<Router>,
    pub gov: Address,
    pub alice: Address,
    pub bob: Address,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_decimals(18)
    }

    pub fn with_decimals(decimals: u8) -> Self {
        let ledger = Arc::new(InMemoryLedger::new());
        let gov = Address::derive("gov");
        let token = Arc::new(
            SandboxToken::deploy(ledger.clone(), Address::derive("DAI"), "DAI", decimals).unwrap(),
        );
        let registry = Arc::new(SandboxRegistry::new(Address::derive("registry"), gov));
        let directory: Arc<dyn Directory> = registry.clone();
        let host: Arc<dyn TransactionHost> = ledger.clone();
        let router = Arc::new(Router::new(Address::derive("router"), gov, directory, host));
        Self {
            ledger,
            token,
            registry,
            router,
            gov,
            alice: Address::derive("alice"),
            bob: Address::derive("bob"),
        }
    }

    /// Deploy a vault for the fixture asset and endorse it as the new preferred backend.
    pub fn add_vault(&self, name: &str) -> Arc<SandboxVault> {
        self.add_vault_with(name, true)
    }

    pub fn add_vault_with(&self, name: &str, mints_to_recipient: bool) -> Arc<SandboxVault> {
        let vault = Arc::new(
            SandboxVault::deploy(
                self.ledger.clone(),
                Address::derive(name),
                self.token.address(),
                name,
                mints_to_recipient,
            )
            .unwrap(),
        );
        self.registry.endorse(&self.gov, vault.clone()).unwrap();
        vault
    }

    /// Mint `amount` to `who` and let the router pull it.
    pub async fn fund(&self, who: &Address, amount: u128) {
        self.token.mint(who, amount).unwrap();
        self.token
            .approve(who, &self.router.address(), u128::MAX)
            .await
            .unwrap();
    }

    pub async fn balance(&self, who: &Address) -> u128 {
        self.token.balance_of(who).await.unwrap()
    }

    pub async fn shares(&self, vault: &SandboxVault, who: &Address) -> u128 {
        vault.share_balance_of(who).await.unwrap()
    }

    /// Seed a position in `vault` directly, bypassing the router.
    pub async fn deposit_direct(&self, vault: &SandboxVault, who: &Address, amount: u128) {
        self.token.mint(who, amount).unwrap();
        self.token
            .approve(who, &vault.address(), amount)
            .await
            .unwrap();
        vault.deposit(who, amount, who).await.unwrap();
    }

    pub fn token_address(&self) -> Address {
        self.token.address()
    }

    pub async fn router_balance(&self) -> u128 {
        self.balance(&self.router.address()).await
    }
}
