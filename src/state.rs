// Router persistent state
//
// Exactly two fields survive between calls: the administrative owner and the
// directory backends are resolved from. Positions are never stored here.
//
// Numan Thabit 2025 Nov

use crate::address::Address;
use crate::ports::directory::Directory;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Inner {
    owner: Address,
    directory: Arc<dyn Directory>,
}

pub struct RouterState {
    inner: RwLock<Inner>,
}

impl RouterState {
    pub fn new(owner: Address, directory: Arc<dyn Directory>) -> Self {
        Self {
            inner: RwLock::new(Inner { owner, directory }),
        }
    }

    pub async fn owner(&self) -> Address {
        self.inner.read().await.owner
    }

    pub async fn directory(&self) -> Arc<dyn Directory> {
        Arc::clone(&self.inner.read().await.directory)
    }

    /// Replace the owner, returning the previous one.
    pub(crate) async fn replace_owner(&self, owner: Address) -> Address {
        std::mem::replace(&mut self.inner.write().await.owner, owner)
    }

    /// Replace the directory, returning the previous one.
    pub(crate) async fn replace_directory(&self, directory: Arc<dyn Directory>) -> Arc<dyn Directory> {
        std::mem::replace(&mut self.inner.write().await.directory, directory)
    }
}
