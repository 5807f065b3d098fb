// Configuration management module
// This file handles loading of the service settings from the environment
// and of the sandbox world description from YAML
//
// Numan Thabit 2025 Nov

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP API listen address, e.g. 0.0.0.0:8080
    pub api_addr: String,
    /// Path of the sandbox world YAML
    pub world_file: String,
    /// Seconds between heartbeat log lines
    pub heartbeat_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let cfg = config::Config::builder()
            .set_default("api_addr", "0.0.0.0:8080")?
            .set_default("world_file", "world.yaml")?
            .set_default("heartbeat_secs", 30)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }

    pub fn api_socket_addr(&self) -> Result<SocketAddr> {
        self.api_addr
            .parse()
            .with_context(|| format!("invalid API address: {}", self.api_addr))
    }
}

/// Everything the sandbox deploys at startup.
///
/// Accounts, directories, assets and backends are placed at addresses derived
/// from their names unless `aliases` pins a name to an explicit address.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    /// name -> EIP-55 checksummed address
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Named accounts with no other role (depositors, operators).
    #[serde(default)]
    pub accounts: Vec<String>,
    pub router: RouterSettings,
    pub directories: Vec<DirectorySettings>,
    pub assets: Vec<AssetSettings>,
    #[serde(default)]
    pub backends: Vec<BackendSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouterSettings {
    /// Name the router is deployed under (defaults to "router")
    pub name: Option<String>,
    /// Alias or address of the owner
    pub owner: String,
    /// Name of the initial directory
    pub directory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectorySettings {
    pub name: String,
    /// Alias or address of the governance principal
    pub governance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetSettings {
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    /// alias -> initial balance
    #[serde(default)]
    pub balances: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub name: String,
    /// Symbol of the asset the backend accepts
    pub asset: String,
    /// Name of the directory that endorses it; endorsement follows file order
    pub directory: String,
    pub deposit_limit: Option<u64>,
    #[serde(default = "default_true")]
    pub mints_to_recipient: bool,
}

fn default_decimals() -> u8 {
    18
}

fn default_true() -> bool {
    true
}

impl WorldConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("parse world YAML")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read world file {}", path.display()))?;
        Self::from_yaml(&raw)
    }
}
