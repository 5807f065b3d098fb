// Sandbox backend directory
//
// Append-only endorsement per asset (the latest endorsement is preferred)
// and a two-step governance handoff.
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::errors::LedgerError;
use crate::ports::backend::BackendRef;
use crate::ports::directory::Directory;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

struct RegistryState {
    governance: Address,
    pending_governance: Option<Address>,
    backends: HashMap<Address, Vec<BackendRef>>,
}

pub struct SandboxRegistry {
    address: Address,
    state: RwLock<RegistryState>,
}

impl SandboxRegistry {
    pub fn new(address: Address, governance: Address) -> Self {
        Self {
            address,
            state: RwLock::new(RegistryState {
                governance,
                pending_governance: None,
                backends: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `backend` as the newest (preferred) backend for its asset.
    pub fn endorse(&self, caller: &Address, backend: BackendRef) -> Result<(), LedgerError> {
        let mut state = self.write();
        if *caller != state.governance {
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                action: "endorse backend".to_string(),
            });
        }
        let list = state.backends.entry(backend.asset()).or_default();
        if list.iter().any(|b| b.address() == backend.address()) {
            return Err(LedgerError::Rejected(format!(
                "backend {} already endorsed",
                backend.address()
            )));
        }
        info!(
            directory = %self.address,
            asset = %backend.asset(),
            backend = %backend.address(),
            position = list.len(),
            "backend endorsed"
        );
        list.push(backend);
        Ok(())
    }

    pub fn pending_governance(&self) -> Option<Address> {
        self.read().pending_governance
    }
}

#[async_trait]
impl Directory for SandboxRegistry {
    fn address(&self) -> Address {
        self.address
    }

    async fn count_backends(&self, asset: &Address) -> Result<usize, LedgerError> {
        Ok(self.read().backends.get(asset).map_or(0, Vec::len))
    }

    async fn backend_at(&self, asset: &Address, index: usize) -> Result<BackendRef, LedgerError> {
        let state = self.read();
        let list = state.backends.get(asset).map(Vec::as_slice).unwrap_or(&[]);
        list.get(index)
            .cloned()
            .ok_or(LedgerError::IndexOutOfRange {
                asset: *asset,
                index,
                count: list.len(),
            })
    }

    async fn preferred_backend(&self, asset: &Address) -> Result<BackendRef, LedgerError> {
        self.read()
            .backends
            .get(asset)
            .and_then(|list| list.last().cloned())
            .ok_or(LedgerError::NoBackends { asset: *asset })
    }

    async fn governance(&self) -> Result<Address, LedgerError> {
        Ok(self.read().governance)
    }

    async fn propose_governance(
        &self,
        caller: &Address,
        pending: &Address,
    ) -> Result<(), LedgerError> {
        let mut state = self.write();
        if *caller != state.governance {
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                action: "propose governance".to_string(),
            });
        }
        state.pending_governance = Some(*pending);
        Ok(())
    }

    async fn accept_governance(&self, caller: &Address) -> Result<(), LedgerError> {
        let mut state = self.write();
        if state.pending_governance != Some(*caller) {
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                action: "accept governance".to_string(),
            });
        }
        state.governance = *caller;
        state.pending_governance = None;
        info!(directory = %self.address, governance = %caller, "governance accepted");
        Ok(())
    }
}
