//! Catalog sources: where the item list comes from at startup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use shelfscan_core::{DomainError, ScanError};
use shelfscan_inventory::{InventoryStore, ItemRecord};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalog: {0}")]
    Invalid(#[from] DomainError),
}

impl From<CatalogError> for ScanError {
    fn from(err: CatalogError) -> Self {
        ScanError::catalog_fetch(err.to_string())
    }
}

/// Provider of the catalog's item records.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short human-readable origin, for logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<ItemRecord>, CatalogError>;
}

/// Parse a JSON array of item records.
pub fn parse_catalog(bytes: &[u8]) -> Result<Vec<ItemRecord>, CatalogError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Fetch records and build a fresh store (every item pending).
pub async fn load_store<S>(source: &S) -> Result<InventoryStore, CatalogError>
where
    S: CatalogSource + ?Sized,
{
    let records = source.fetch().await?;
    let store = InventoryStore::load(records)?;
    debug!(source = %source.describe(), items = store.len(), "catalog loaded");
    Ok(store)
}

/// JSON array file on disk (`all_books.json`).
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for JsonFileCatalog {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<ItemRecord>, CatalogError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| CatalogError::Io {
                path: self.path.clone(),
                source,
            })?;
        parse_catalog(&bytes)
    }
}

/// In-memory records (embedded catalogs, tests).
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<ItemRecord>,
}

impl StaticCatalog {
    pub fn new(records: impl IntoIterator<Item = ItemRecord>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    fn describe(&self) -> String {
        format!("static catalog ({} records)", self.records.len())
    }

    async fn fetch(&self) -> Result<Vec<ItemRecord>, CatalogError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use shelfscan_core::{Entity, ItemId};

    use super::*;

    const BOOKS: &str = r#"[
        {"id": 1, "jan": "4901234567894", "title": "A", "publisher": "P"},
        {"id": "b-2", "isbn": 9784065193511, "title": "B", "shelf": "3F"}
    ]"#;

    #[test]
    fn parses_numeric_and_string_fields() {
        let records = parse_catalog(BOOKS.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, ItemId::from(1));
        assert_eq!(records[1].id, ItemId::new("b-2").unwrap());
        assert_eq!(records[1].isbn.as_deref(), Some("9784065193511"));
        assert_eq!(records[1].display.extra["shelf"], "3F");
    }

    #[test]
    fn rejects_non_array_documents() {
        let err = parse_catalog(br#"{"id": 1}"#).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn loads_a_json_file_into_a_pending_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(BOOKS.as_bytes()).unwrap();

        let store = load_store(&JsonFileCatalog::new(file.path())).await.unwrap();
        assert_eq!(store.pending_len(), 2);
        assert_eq!(store.matched_len(), 0);
        assert_eq!(store.pending()[1].id(), &ItemId::new("b-2").unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = JsonFileCatalog::new(dir.path().join("all_books.json"));

        let err = load_store(&catalog).await.unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(matches!(ScanError::from(err), ScanError::CatalogFetch(_)));
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let catalog = StaticCatalog::new([
            ItemRecord::new(ItemId::from(7)).with_jan("1"),
            ItemRecord::new(ItemId::from(7)).with_jan("2"),
        ]);
        let err = load_store(&catalog).await.unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(DomainError::Conflict(_))));
    }
}
