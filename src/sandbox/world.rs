// Sandbox world builder
// Deploys the ledger, assets, directories and vaults described by a
// WorldConfig and puts a router in front of them
//
// Numan Thabit 2025 Nov

use crate::address::{Address, AddressBook};
use crate::config::WorldConfig;
use crate::errors::AddressError;
use crate::ports::asset::Asset;
use crate::ports::directory::Directory;
use crate::ports::host::TransactionHost;
use crate::router::Router;
use crate::sandbox::ledger::InMemoryLedger;
use crate::sandbox::registry::SandboxRegistry;
use crate::sandbox::token::SandboxToken;
use crate::sandbox::vault::SandboxVault;
use anyhow::{anyhow, bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

const DEFAULT_ROUTER_NAME: &str = "router";

/// A deployed sandbox: every contract the router can reach, addressable by
/// address or by the name it was deployed under.
pub struct Sandbox {
    ledger: Arc<InMemoryLedger>,
    book: AddressBook,
    tokens: HashMap<Address, Arc<SandboxToken>>,
    registries: HashMap<Address, Arc<SandboxRegistry>>,
    vaults: HashMap<Address, Arc<SandboxVault>>,
    router: Arc<Router>,
}

impl Sandbox {
    pub fn build(world: &WorldConfig) -> Result<Self> {
        let mut placer = Placer::new(&world.aliases);

        let router_name = world
            .router
            .name
            .as_deref()
            .unwrap_or(DEFAULT_ROUTER_NAME);
        let router_addr = placer.place(router_name)?;

        let mut dir_addrs = Vec::with_capacity(world.directories.len());
        for dir in &world.directories {
            dir_addrs.push(placer.place(&dir.name)?);
        }
        let mut asset_addrs = Vec::with_capacity(world.assets.len());
        for asset in &world.assets {
            asset_addrs.push(placer.place(&asset.symbol)?);
        }
        let mut vault_addrs = Vec::with_capacity(world.backends.len());
        for backend in &world.backends {
            vault_addrs.push(placer.place(&backend.name)?);
        }
        for name in world.aliases.keys().chain(world.accounts.iter()) {
            if placer.book.get(name).is_none() {
                placer.place(name)?;
            }
        }
        let book = placer.book;

        let ledger = Arc::new(InMemoryLedger::new());

        let mut registries = HashMap::new();
        let mut registries_by_name = HashMap::new();
        for (dir, address) in world.directories.iter().zip(dir_addrs) {
            let governance = resolve(&book, &dir.governance)
                .with_context(|| format!("governance of directory {}", dir.name))?;
            let registry = Arc::new(SandboxRegistry::new(address, governance));
            registries.insert(address, registry.clone());
            registries_by_name.insert(dir.name.to_ascii_lowercase(), (registry, governance));
        }

        let mut tokens = HashMap::new();
        let mut tokens_by_symbol = HashMap::new();
        for (asset, address) in world.assets.iter().zip(asset_addrs) {
            let token = Arc::new(
                SandboxToken::deploy(ledger.clone(), address, &asset.symbol, asset.decimals)
                    .with_context(|| format!("deploy asset {}", asset.symbol))?,
            );
            for (holder, amount) in &asset.balances {
                let holder = resolve(&book, holder)
                    .with_context(|| format!("balance holder of {}", asset.symbol))?;
                token.mint(&holder, u128::from(*amount))?;
            }
            tokens.insert(address, token.clone());
            tokens_by_symbol.insert(asset.symbol.to_ascii_lowercase(), token);
        }

        let mut vaults = HashMap::new();
        for (backend, address) in world.backends.iter().zip(vault_addrs) {
            let token = tokens_by_symbol
                .get(&backend.asset.to_ascii_lowercase())
                .ok_or_else(|| {
                    anyhow!("backend {} references unknown asset {}", backend.name, backend.asset)
                })?;
            let (registry, governance) = registries_by_name
                .get(&backend.directory.to_ascii_lowercase())
                .ok_or_else(|| {
                    anyhow!(
                        "backend {} references unknown directory {}",
                        backend.name,
                        backend.directory
                    )
                })?;
            let vault = Arc::new(
                SandboxVault::deploy(
                    ledger.clone(),
                    address,
                    token.address(),
                    &backend.name,
                    backend.mints_to_recipient,
                )
                .with_context(|| format!("deploy backend {}", backend.name))?,
            );
            vault.set_deposit_limit(backend.deposit_limit.map(u128::from));
            registry
                .endorse(governance, vault.clone())
                .with_context(|| format!("endorse backend {}", backend.name))?;
            vaults.insert(address, vault);
        }

        let owner = resolve(&book, &world.router.owner).context("router owner")?;
        let (directory, governance) = registries_by_name
            .get(&world.router.directory.to_ascii_lowercase())
            .ok_or_else(|| anyhow!("router references unknown directory {}", world.router.directory))?;
        if *governance != owner {
            bail!(
                "router owner {} is not the governance ({}) of directory {}",
                owner,
                governance,
                world.router.directory
            );
        }

        let directory: Arc<dyn Directory> = directory.clone();
        let host: Arc<dyn TransactionHost> = ledger.clone();
        let router = Arc::new(Router::new(router_addr, owner, directory, host));

        info!(
            assets = tokens.len(),
            directories = registries.len(),
            backends = vaults.len(),
            names = book.len(),
            "sandbox world deployed"
        );

        Ok(Self {
            ledger,
            book,
            tokens,
            registries,
            vaults,
            router,
        })
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }

    pub fn book(&self) -> &AddressBook {
        &self.book
    }

    /// Checksummed address or deployed name.
    pub fn resolve(&self, input: &str) -> Result<Address, AddressError> {
        self.book.resolve(input)
    }

    pub fn token(&self, address: &Address) -> Option<Arc<SandboxToken>> {
        self.tokens.get(address).cloned()
    }

    pub fn registry(&self, address: &Address) -> Option<Arc<SandboxRegistry>> {
        self.registries.get(address).cloned()
    }

    pub fn vault(&self, address: &Address) -> Option<Arc<SandboxVault>> {
        self.vaults.get(address).cloned()
    }

    pub fn vaults(&self) -> impl Iterator<Item = &Arc<SandboxVault>> {
        self.vaults.values()
    }
}

fn resolve(book: &AddressBook, input: &str) -> Result<Address> {
    book.resolve(input).map_err(|e| anyhow!("{e}"))
}

/// Hands out addresses for deployed names, honouring pinned aliases.
struct Placer<'a> {
    pinned: &'a BTreeMap<String, String>,
    book: AddressBook,
}

impl<'a> Placer<'a> {
    fn new(pinned: &'a BTreeMap<String, String>) -> Self {
        Self {
            pinned,
            book: AddressBook::new(),
        }
    }

    fn place(&mut self, name: &str) -> Result<Address> {
        if self.book.get(name).is_some() {
            bail!("name {name} is used twice in the world file");
        }
        let address = match self.pinned.get(name) {
            Some(raw) => Address::parse_checksummed(raw)
                .map_err(|e| anyhow!("alias {name}: {e}"))?,
            None => Address::derive(name),
        };
        self.book.insert(name, address);
        Ok(address)
    }
}
