// Backend selector - resolves the preferred backend and the full backend
// list for an asset straight from the directory, on every call
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::{LedgerError, RouterError};
use crate::ports::backend::BackendRef;
use crate::ports::directory::Directory;
use tracing::debug;

/// Stateless view over a directory. Nothing is cached between calls.
pub struct BackendSelector<'a> {
    directory: &'a dyn Directory,
}

impl<'a> BackendSelector<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }

    /// Preferred backend for `asset`; `NoBackendAvailable` when none is registered.
    pub async fn best(&self, asset: &Address) -> Result<BackendRef, RouterError> {
        if self.directory.count_backends(asset).await? == 0 {
            return Err(RouterError::NoBackendAvailable { asset: *asset });
        }
        match self.directory.preferred_backend(asset).await {
            Ok(backend) => Ok(backend),
            Err(LedgerError::NoBackends { asset }) => Err(RouterError::NoBackendAvailable { asset }),
            Err(e) => Err(e.into()),
        }
    }

    /// Every backend for `asset`, oldest first, preferred last. Empty when none.
    pub async fn all(&self, asset: &Address) -> Result<Vec<BackendRef>, RouterError> {
        let count = self.directory.count_backends(asset).await?;
        let mut backends = Vec::with_capacity(count);
        for index in 0..count {
            backends.push(self.directory.backend_at(asset, index).await?);
        }
        debug!(asset = %asset, count = count, "resolved backends");
        Ok(backends)
    }
}
