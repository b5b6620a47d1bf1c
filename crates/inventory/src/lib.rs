//! Inventory domain module.
//!
//! Pure, deterministic stock-take logic (no IO, no async): catalog items and
//! their identifying codes, the pending/matched store, and the matcher that
//! moves an item once one of its codes is scanned.

pub mod code;
pub mod item;
pub mod matcher;
pub mod shared;
pub mod store;

pub use code::{CodeKind, IdentifyingCode, normalize_code};
pub use item::{DisplayFields, Item, ItemRecord};
pub use matcher::find_match;
pub use shared::{Inventory, InventorySnapshot};
pub use store::{InventoryStore, ItemStatus};
