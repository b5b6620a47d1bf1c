use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfscan_core::{BarcodeFormat, Facing, ItemId};

use crate::{Event, EventEnvelope};

/// Why a scan loop went back to idle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Explicit stop command.
    Requested,
    /// Stopped in order to restart on the other camera.
    CameraSwitch,
    /// The owning component was torn down.
    Teardown,
}

/// Event: ScanStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStarted {
    pub facing: Facing,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ScanStopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStopped {
    pub reason: StopReason,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SymbolScanned (the first symbol decoded in a cycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolScanned {
    pub symbol: String,
    pub format: Option<BarcodeFormat>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemMatched (moved from pending to matched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMatched {
    pub item_id: ItemId,
    pub symbol: String,
    pub title: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: NoMatch (symbol decoded, nothing pending carries it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoMatch {
    pub symbol: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetectionFailed (single cycle; the loop keeps running).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionFailed {
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CameraUnavailable (start failed; the loop stays idle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraUnavailable {
    pub facing: Facing,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetectionUnsupported (reported once per session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionUnsupported {
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CatalogLoaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLoaded {
    pub item_count: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CatalogUnavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogUnavailable {
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanEvent {
    ScanStarted(ScanStarted),
    ScanStopped(ScanStopped),
    SymbolScanned(SymbolScanned),
    ItemMatched(ItemMatched),
    NoMatch(NoMatch),
    DetectionFailed(DetectionFailed),
    CameraUnavailable(CameraUnavailable),
    DetectionUnsupported(DetectionUnsupported),
    CatalogLoaded(CatalogLoaded),
    CatalogUnavailable(CatalogUnavailable),
}

/// What scan-workflow observers receive.
pub type ScanEnvelope = EventEnvelope<ScanEvent>;

impl ScanEvent {
    /// Whether this event reports a failure a user should see.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ScanEvent::DetectionFailed(_)
                | ScanEvent::CameraUnavailable(_)
                | ScanEvent::DetectionUnsupported(_)
                | ScanEvent::CatalogUnavailable(_)
        )
    }
}

impl Event for ScanEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ScanEvent::ScanStarted(_) => "scan.loop.started",
            ScanEvent::ScanStopped(_) => "scan.loop.stopped",
            ScanEvent::SymbolScanned(_) => "scan.symbol.decoded",
            ScanEvent::ItemMatched(_) => "inventory.item.matched",
            ScanEvent::NoMatch(_) => "inventory.item.unmatched",
            ScanEvent::DetectionFailed(_) => "scan.detection.failed",
            ScanEvent::CameraUnavailable(_) => "scan.camera.unavailable",
            ScanEvent::DetectionUnsupported(_) => "scan.detection.unsupported",
            ScanEvent::CatalogLoaded(_) => "catalog.loaded",
            ScanEvent::CatalogUnavailable(_) => "catalog.unavailable",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ScanEvent::ScanStarted(e) => e.occurred_at,
            ScanEvent::ScanStopped(e) => e.occurred_at,
            ScanEvent::SymbolScanned(e) => e.occurred_at,
            ScanEvent::ItemMatched(e) => e.occurred_at,
            ScanEvent::NoMatch(e) => e.occurred_at,
            ScanEvent::DetectionFailed(e) => e.occurred_at,
            ScanEvent::CameraUnavailable(e) => e.occurred_at,
            ScanEvent::DetectionUnsupported(e) => e.occurred_at,
            ScanEvent::CatalogLoaded(e) => e.occurred_at,
            ScanEvent::CatalogUnavailable(e) => e.occurred_at,
        }
    }
}
