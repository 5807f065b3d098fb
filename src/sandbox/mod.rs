// Sandbox module - in-memory assets, vaults and directories the router can
// be driven against, plus the world builder that wires them from YAML
//
// Numan Thabit 2025 Nov

pub mod ledger;
pub mod registry;
pub mod token;
pub mod vault;
pub mod world;

pub use ledger::InMemoryLedger;
pub use registry::SandboxRegistry;
pub use token::SandboxToken;
pub use vault::SandboxVault;
pub use world::Sandbox;
