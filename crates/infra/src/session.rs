//! One scanning session: catalog, inventory, scanner and the event stream,
//! wired together.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{debug, info, warn};

use shelfscan_core::{ScanError, SessionId};
use shelfscan_events::{
    CatalogLoaded, CatalogUnavailable, EventBus, EventPublisher, ProjectionRunner, ScanEnvelope,
    ScanEvent, Subscription,
};
use shelfscan_inventory::{Inventory, InventoryStore};
use shelfscan_scanner::{CameraSource, Detector, ScanLoop, ScanState};

use crate::catalog::{CatalogSource, JsonFileCatalog, load_store};
use crate::config::ScannerConfig;
use crate::projections::activity_log::ActivityLog;
use crate::projections::live::LiveProjectionBus;

/// Bus every session publishes on; UI observers subscribe to it. The activity
/// log is applied on publish.
pub type SessionBus = Arc<LiveProjectionBus<ActivityLog>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogState {
    Loading,
    Ready { item_count: usize },
    /// Fetch failed; the store is empty until a reload succeeds.
    Unavailable { message: String },
}

impl CatalogState {
    pub fn is_ready(&self) -> bool {
        matches!(self, CatalogState::Ready { .. })
    }
}

pub struct ScanSession<C, D, K>
where
    C: CameraSource,
    D: Detector,
    K: CatalogSource,
{
    id: SessionId,
    catalog: K,
    catalog_state: CatalogState,
    inventory: Inventory,
    bus: SessionBus,
    events: Arc<EventPublisher<SessionBus>>,
    scanner: ScanLoop<C, D, SessionBus>,
}

impl<C, D> ScanSession<C, D, JsonFileCatalog>
where
    C: CameraSource,
    D: Detector,
{
    /// Install logging, then open a session on the configured catalog file.
    pub async fn bootstrap(
        config: &ScannerConfig,
        camera: Arc<C>,
        detector: Arc<D>,
    ) -> anyhow::Result<Self> {
        shelfscan_observability::init_with(&config.log);
        let catalog = JsonFileCatalog::new(&config.catalog_path);
        Self::open(config, camera, detector, catalog).await
    }
}

impl<C, D, K> ScanSession<C, D, K>
where
    C: CameraSource,
    D: Detector,
    K: CatalogSource,
{
    /// Probe the detector, load the catalog, and return an idle session.
    ///
    /// Fails only on an invalid configuration. A failed catalog fetch does not
    /// fail the session: the state becomes [`CatalogState::Unavailable`] and
    /// [`reload_catalog`](Self::reload_catalog) can retry.
    pub async fn open(
        config: &ScannerConfig,
        camera: Arc<C>,
        detector: Arc<D>,
        catalog: K,
    ) -> anyhow::Result<Self> {
        config.validate().context("cannot open scan session")?;

        let id = SessionId::new();
        let bus: SessionBus = Arc::new(LiveProjectionBus::new(ProjectionRunner::new_for_session(
            id,
            ActivityLog::new(config.activity_log_capacity),
        )));
        let events = Arc::new(EventPublisher::new(id, bus.clone()));
        let inventory = Inventory::default();

        let scanner = ScanLoop::new(
            camera,
            detector,
            inventory.clone(),
            events.clone(),
            config.scan_loop(),
        )
        .await;

        let mut session = Self {
            id,
            catalog,
            catalog_state: CatalogState::Loading,
            inventory,
            bus,
            events,
            scanner,
        };

        // Failure is recorded in the catalog state.
        let _ = session.load_catalog().await;
        info!(session_id = %id, catalog = ?session.catalog_state, "scan session opened");
        Ok(session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn catalog_state(&self) -> &CatalogState {
        &self.catalog_state
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn scanner(&self) -> &ScanLoop<C, D, SessionBus> {
        &self.scanner
    }

    pub fn scan_state(&self) -> ScanState {
        self.scanner.state()
    }

    /// New observer of this session's events (sees events from now on).
    pub fn subscribe(&self) -> Subscription<ScanEnvelope> {
        self.bus.subscribe()
    }

    /// Retry the catalog fetch. Returns the item count.
    ///
    /// No-op once the catalog is ready: reloading would reset every match.
    pub async fn reload_catalog(&mut self) -> Result<usize, ScanError> {
        if let CatalogState::Ready { item_count } = self.catalog_state {
            debug!(session_id = %self.id, "catalog already loaded");
            return Ok(item_count);
        }
        self.load_catalog().await
    }

    pub async fn start_scanning(&mut self) -> Result<(), ScanError> {
        self.scanner.start().await
    }

    pub async fn stop_scanning(&mut self) -> bool {
        self.scanner.stop().await
    }

    pub async fn switch_camera(&mut self) -> Result<(), ScanError> {
        self.scanner.switch_camera().await
    }

    /// Snapshot of the activity log as of the last published event.
    pub fn activity_log(&self) -> ActivityLog {
        self.bus.read(ActivityLog::clone)
    }

    async fn load_catalog(&mut self) -> Result<usize, ScanError> {
        self.catalog_state = CatalogState::Loading;

        match load_store(&self.catalog).await {
            Ok(store) => {
                let item_count = store.len();
                self.inventory.replace(store);
                self.catalog_state = CatalogState::Ready { item_count };
                self.events.publish(ScanEvent::CatalogLoaded(CatalogLoaded {
                    item_count,
                    occurred_at: Utc::now(),
                }));
                info!(session_id = %self.id, source = %self.catalog.describe(), item_count, "catalog ready");
                Ok(item_count)
            }
            Err(err) => {
                let err = ScanError::from(err);
                warn!(session_id = %self.id, source = %self.catalog.describe(), error = %err, "catalog unavailable");
                self.inventory.replace(InventoryStore::empty());
                self.catalog_state = CatalogState::Unavailable {
                    message: err.to_string(),
                };
                self.events.publish(ScanEvent::CatalogUnavailable(CatalogUnavailable {
                    message: err.to_string(),
                    occurred_at: Utc::now(),
                }));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use shelfscan_core::ItemId;
    use shelfscan_inventory::{ItemRecord, ItemStatus};
    use shelfscan_scanner::{CameraError, ScriptedCamera, ScriptedDetector};

    use super::*;
    use crate::catalog::StaticCatalog;

    fn two_books() -> StaticCatalog {
        StaticCatalog::new([
            ItemRecord::new(ItemId::from(1))
                .with_jan("4901234567894")
                .with_title("A"),
            ItemRecord::new(ItemId::from(2))
                .with_isbn("978-4-06-519351-1")
                .with_title("B"),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn two_book_stocktake() {
        let config = ScannerConfig::default();
        let camera = Arc::new(ScriptedCamera::new());
        let detector = Arc::new(
            ScriptedDetector::new()
                .then_symbols(["9784065193511"])
                .then_symbols(["9784065193511"])
                .then_symbols(["4901234567894"]),
        );

        let mut session = ScanSession::open(&config, camera.clone(), detector, two_books())
            .await
            .unwrap();
        assert_eq!(session.catalog_state(), &CatalogState::Ready { item_count: 2 });

        session.start_scanning().await.unwrap();
        tokio::time::sleep(config.poll_interval * 3 + Duration::from_millis(50)).await;
        assert!(session.stop_scanning().await);

        let entries: Vec<(ItemId, ItemStatus)> = session
            .inventory()
            .read(|s| s.entries().into_iter().map(|(i, st)| (i.record().id.clone(), st)).collect());
        assert_eq!(
            entries,
            vec![
                (ItemId::from(1), ItemStatus::Matched),
                (ItemId::from(2), ItemStatus::Matched),
            ]
        );

        assert_eq!(
            session.activity_log().messages(),
            vec![
                "Loaded 2 items",
                "Scanning started",
                "Scanned: 9784065193511 - Matched: B",
                "Scanned: 9784065193511 - No match found",
                "Scanned: 4901234567894 - Matched: A",
                "Scanning stopped",
            ]
        );
        assert_eq!(camera.releases(), 1);
    }

    #[tokio::test]
    async fn failed_catalog_can_be_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_books.json");
        let config = ScannerConfig {
            catalog_path: path.clone(),
            ..ScannerConfig::default()
        };

        let mut session = ScanSession::bootstrap(
            &config,
            Arc::new(ScriptedCamera::new()),
            Arc::new(ScriptedDetector::new()),
        )
        .await
        .unwrap();

        assert!(matches!(
            session.catalog_state(),
            CatalogState::Unavailable { .. }
        ));
        assert_eq!(session.inventory().pending_len(), 0);
        assert!(
            session.activity_log().messages()[0].starts_with("Failed to load catalog:")
        );

        tokio::fs::write(&path, r#"[{"id": 1, "jan": "4901234567894"}]"#)
            .await
            .unwrap();
        assert_eq!(session.reload_catalog().await.unwrap(), 1);
        assert!(session.catalog_state().is_ready());
        assert_eq!(session.inventory().pending_len(), 1);

        // Ready catalogs are not refetched.
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(session.reload_catalog().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn camera_errors_reach_the_activity_log() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.fail_next_open(CameraError::PermissionDenied);

        let mut session = ScanSession::open(
            &ScannerConfig::default(),
            camera,
            Arc::new(ScriptedDetector::new()),
            two_books(),
        )
        .await
        .unwrap();

        let err = session.start_scanning().await.unwrap_err();
        assert!(matches!(err, ScanError::CameraUnavailable(_)));
        assert_eq!(session.scan_state(), ScanState::Idle);
        assert_eq!(session.inventory().pending_len(), 2);
        assert_eq!(
            session.activity_log().messages().last(),
            Some(&"Camera error: camera permission denied")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_detection_is_logged_once() {
        let mut session = ScanSession::open(
            &ScannerConfig::default(),
            Arc::new(ScriptedCamera::new()),
            Arc::new(ScriptedDetector::new().unavailable("no detector")),
            two_books(),
        )
        .await
        .unwrap();

        assert!(!session.scanner().is_supported());
        session.start_scanning().await.unwrap_err();
        session.start_scanning().await.unwrap_err();
        assert_eq!(
            session.activity_log().messages(),
            vec![
                "Barcode detection is not supported on this device",
                "Loaded 2 items",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn activity_log_stays_bounded_while_nobody_reads_it() {
        let mut detector = ScriptedDetector::new();
        for i in 0..200 {
            detector = detector.then_fail(format!("glare {i}"));
        }
        let config = ScannerConfig::default();

        let mut session = ScanSession::open(
            &config,
            Arc::new(ScriptedCamera::new()),
            Arc::new(detector),
            two_books(),
        )
        .await
        .unwrap();

        session.start_scanning().await.unwrap();
        tokio::time::sleep(config.poll_interval * 200 + Duration::from_millis(50)).await;
        assert!(session.stop_scanning().await);

        // The log is kept current on publish; no session-owned queue exists.
        assert_eq!(session.bus.subscriber_count(), 0);
        let log = session.activity_log();
        assert_eq!(log.len(), config.activity_log_capacity);
        assert_eq!(
            &log.messages()[log.len() - 2..],
            ["Error: decode failed: glare 199", "Scanning stopped"]
        );
    }

    #[tokio::test]
    async fn invalid_config_refuses_to_open() {
        let config = ScannerConfig {
            poll_interval: Duration::ZERO,
            ..ScannerConfig::default()
        };
        let camera = Arc::new(ScriptedCamera::new());

        let err = ScanSession::open(
            &config,
            camera.clone(),
            Arc::new(ScriptedDetector::new()),
            two_books(),
        )
        .await
        .err()
        .unwrap();

        assert!(format!("{err:#}").contains("poll interval"));
        assert_eq!(camera.opens(), 0);
    }
}
