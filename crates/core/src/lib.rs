//! `shelfscan-core`: shared building blocks for the stock-take workspace.
//!
//! This crate contains **pure** primitives (no IO, no async): identifiers, the
//! error taxonomy, barcode symbologies and the camera facing selector.

pub mod entity;
pub mod error;
pub mod facing;
pub mod id;
pub mod symbology;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, ScanError, ScanResult};
pub use facing::Facing;
pub use id::{ItemId, SessionId};
pub use symbology::{BarcodeFormat, RETAIL_FORMATS, negotiate_formats};
pub use value_object::ValueObject;
