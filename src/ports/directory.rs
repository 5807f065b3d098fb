// Backend directory interface
// Per-asset, append-ordered registry of backends; the last entry for an
// asset is the preferred one
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use crate::ports::backend::BackendRef;
use async_trait::async_trait;

#[async_trait]
pub trait Directory: Send + Sync {
    fn address(&self) -> Address;

    async fn count_backends(&self, asset: &Address) -> Result<usize, LedgerError>;

    /// Backend at `index` in endorsement order (0 is the oldest).
    async fn backend_at(&self, asset: &Address, index: usize) -> Result<BackendRef, LedgerError>;

    /// Most recently endorsed backend; fails when none is registered.
    async fn preferred_backend(&self, asset: &Address) -> Result<BackendRef, LedgerError>;

    /// Principal currently recognized as this directory's governance.
    async fn governance(&self) -> Result<Address, LedgerError>;

    /// First half of the governance handoff; only the current governance may propose.
    async fn propose_governance(&self, caller: &Address, pending: &Address)
        -> Result<(), LedgerError>;

    /// Second half; only the pending principal may accept.
    async fn accept_governance(&self, caller: &Address) -> Result<(), LedgerError>;
}
