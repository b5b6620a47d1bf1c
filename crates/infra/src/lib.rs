//! Infrastructure layer: catalog sources, configuration, read models and the
//! session wiring that ties the scanner to them.

pub mod catalog;
pub mod config;
pub mod projections;
pub mod session;

pub use catalog::{CatalogError, CatalogSource, JsonFileCatalog, StaticCatalog, load_store, parse_catalog};
pub use config::ScannerConfig;
pub use projections::activity_log::{ActivityLog, LogLine};
pub use projections::live::LiveProjectionBus;
pub use session::{CatalogState, ScanSession, SessionBus};
