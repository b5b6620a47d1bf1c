//! Shared, lock-guarded access to the inventory store.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::item::Item;
use crate::store::InventoryStore;

/// Owned copy of both lists, for observers that must not hold the lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    pub pending: Vec<Item>,
    pub matched: Vec<Item>,
}

/// Cloneable handle to the session's inventory store.
///
/// All writes go through this handle's lock, so the scan loop task (the single
/// writer while scanning) and readers never observe a half-moved item.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    inner: Arc<RwLock<InventoryStore>>,
}

impl Inventory {
    pub fn new(store: InventoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Run a read-only closure against the store.
    pub fn read<R>(&self, f: impl FnOnce(&InventoryStore) -> R) -> R {
        f(&self.read_guard())
    }

    /// Match a scanned symbol and move the hit to the matched list.
    ///
    /// Returns a copy of the moved item.
    pub fn match_symbol(&self, symbol: &str) -> Option<Item> {
        self.write_guard().match_symbol(symbol).cloned()
    }

    /// Swap in a freshly loaded store (catalog reload).
    pub fn replace(&self, store: InventoryStore) {
        *self.write_guard() = store;
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        let store = self.read_guard();
        InventorySnapshot {
            pending: store.pending().to_vec(),
            matched: store.matched().to_vec(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.read(|s| s.pending_len())
    }

    pub fn matched_len(&self) -> usize {
        self.read(|s| s.matched_len())
    }

    // Store mutations cannot panic halfway, so a poisoned lock still guards a
    // consistent store.
    fn read_guard(&self) -> RwLockReadGuard<'_, InventoryStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, InventoryStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
