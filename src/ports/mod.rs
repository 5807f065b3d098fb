// Collaborator interfaces consumed by the router
// Assets, backends, directories and the execution host are external; the
// router only ever talks to them through these traits
//
// Numan Thabit 2025 Nov

pub mod asset;
pub mod backend;
pub mod directory;
pub mod host;

pub use asset::Asset;
pub use backend::{Backend, BackendRef};
pub use directory::Directory;
pub use host::{Snapshot, TransactionHost};
