use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use shelfscan_core::{DomainError, DomainResult, Entity, ItemId};

use crate::item::{Item, ItemRecord};
use crate::matcher::find_match_index;

/// Where an item currently sits in the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Matched,
}

/// The stock-take store: two disjoint ordered sequences of items.
///
/// Invariants:
/// - `pending ∪ matched` is exactly the loaded catalog, `pending ∩ matched = ∅`
/// - item ids are unique
/// - `pending` keeps catalog order; `matched` keeps match order
///
/// The only mutation after loading is [`move_to_matched`](Self::move_to_matched)
/// (usually reached through [`match_symbol`](Self::match_symbol)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryStore {
    pending: Vec<Item>,
    matched: Vec<Item>,
}

impl InventoryStore {
    /// An empty store (catalog not loaded, or unavailable).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from catalog records, in catalog order.
    ///
    /// Rejects catalogs that repeat an item id.
    pub fn load(records: impl IntoIterator<Item = ItemRecord>) -> DomainResult<Self> {
        let mut seen: HashSet<ItemId> = HashSet::new();
        let mut pending = Vec::new();

        for (position, record) in records.into_iter().enumerate() {
            if !seen.insert(record.id.clone()) {
                return Err(DomainError::conflict(format!(
                    "duplicate item id {} in catalog",
                    record.id
                )));
            }
            let item = Item::from_record(position, record);
            if item.codes().is_empty() {
                debug!(item_id = %item.id(), "catalog item has no identifying codes; it can never be matched");
            }
            pending.push(item);
        }

        Ok(Self {
            pending,
            matched: Vec::new(),
        })
    }

    pub fn pending(&self) -> &[Item] {
        &self.pending
    }

    pub fn matched(&self) -> &[Item] {
        &self.matched
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn matched_len(&self) -> usize {
        self.matched.len()
    }

    /// Total number of loaded items.
    pub fn len(&self) -> usize {
        self.pending.len() + self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &ItemId) -> Option<(&Item, ItemStatus)> {
        if let Some(item) = self.pending.iter().find(|i| i.id() == id) {
            return Some((item, ItemStatus::Pending));
        }
        self.matched
            .iter()
            .find(|i| i.id() == id)
            .map(|item| (item, ItemStatus::Matched))
    }

    pub fn status(&self, id: &ItemId) -> Option<ItemStatus> {
        self.get(id).map(|(_, status)| status)
    }

    /// Every item in original catalog order, with its current status.
    pub fn entries(&self) -> Vec<(&Item, ItemStatus)> {
        let mut all: Vec<(&Item, ItemStatus)> = self
            .pending
            .iter()
            .map(|i| (i, ItemStatus::Pending))
            .chain(self.matched.iter().map(|i| (i, ItemStatus::Matched)))
            .collect();
        all.sort_by_key(|(item, _)| item.position());
        all
    }

    /// Move a pending item to the end of the matched list.
    ///
    /// - `Conflict` if the item was already matched
    /// - `NotFound` if the id is not in the store
    pub fn move_to_matched(&mut self, id: &ItemId) -> DomainResult<&Item> {
        match self.pending.iter().position(|i| i.id() == id) {
            Some(index) => Ok(self.move_at(index)),
            None if self.matched.iter().any(|i| i.id() == id) => {
                Err(DomainError::conflict(format!("item {id} already matched")))
            }
            None => Err(DomainError::not_found()),
        }
    }

    /// Match a scanned symbol against the pending items and move the first hit.
    ///
    /// Returns the moved item, or `None` when nothing pending carries the
    /// symbol. Already-matched items are never found again.
    pub fn match_symbol(&mut self, symbol: &str) -> Option<&Item> {
        let index = find_match_index(symbol, &self.pending)?;
        Some(self.move_at(index))
    }

    fn move_at(&mut self, index: usize) -> &Item {
        // `Vec::remove` keeps the relative order of the remaining pending items.
        let item = self.pending.remove(index);
        self.matched.push(item);
        &self.matched[self.matched.len() - 1]
    }
}
