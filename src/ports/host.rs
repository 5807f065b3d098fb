// Execution host transaction boundary
//
// Numan Thabit 2025 Nov

use crate::errors::LedgerError;
use async_trait::async_trait;

/// Opaque handle to a point the host can roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Snapshot(pub u64);

/// All-or-nothing semantics for a router operation.
///
/// The router takes a snapshot before its first call-out and either commits
/// or reverts it once the operation finishes. Snapshots nest: reverting an
/// outer snapshot discards every inner one.
#[async_trait]
pub trait TransactionHost: Send + Sync {
    async fn snapshot(&self) -> Result<Snapshot, LedgerError>;

    async fn commit(&self, snapshot: Snapshot) -> Result<(), LedgerError>;

    async fn revert(&self, snapshot: Snapshot) -> Result<(), LedgerError>;
}
