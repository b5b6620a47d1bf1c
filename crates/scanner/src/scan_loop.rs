//! Cancellable polling loop: camera frame → detector → matcher.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use shelfscan_core::{BarcodeFormat, Entity, Facing, ScanError, ScanResult};
use shelfscan_events::{
    CameraUnavailable, DetectionFailed, DetectionUnsupported, EventBus, EventPublisher,
    ItemMatched, NoMatch, ScanEnvelope, ScanEvent, ScanStarted, ScanStopped, StopReason,
    SymbolScanned,
};
use shelfscan_inventory::Inventory;

use crate::camera::{CameraLease, CameraSource, Capture};
use crate::detector::{DecodedSymbol, Detector, probe};

/// Scan loop configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLoopConfig {
    /// Time between detection cycles
    pub poll_interval: Duration,
    /// Pause between releasing one camera and opening the other
    pub switch_settle: Duration,
    /// Camera used by the first `start`
    pub facing: Facing,
}

impl Default for ScanLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            switch_settle: Duration::from_millis(300),
            facing: Facing::Environment,
        }
    }
}

impl ScanLoopConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_switch_settle(mut self, settle: Duration) -> Self {
        self.switch_settle = settle;
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// A zero poll interval cannot drive a timer.
    pub fn validate(&self) -> ScanResult<()> {
        if self.poll_interval.is_zero() {
            return Err(ScanError::invalid_config("poll interval must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Active { facing: Facing },
}

impl ScanState {
    pub fn is_active(&self) -> bool {
        matches!(self, ScanState::Active { .. })
    }
}

struct ActiveScan {
    facing: Facing,
    lease: Arc<CameraLease>,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

/// Drives periodic detection on a live camera stream and feeds the first
/// decoded symbol of each cycle to the inventory matcher.
///
/// - `Idle → Active` on [`start`](Self::start), `Active → Idle` on
///   [`stop`](Self::stop) or [`switch_camera`](Self::switch_camera).
/// - The camera is released on every exit path (stop, switch, drop), exactly
///   once.
/// - Detection support is probed once, at construction.
pub struct ScanLoop<C, D, B>
where
    C: CameraSource,
    D: Detector,
    B: EventBus<ScanEnvelope> + 'static,
{
    camera: Arc<C>,
    detector: Arc<D>,
    inventory: Inventory,
    events: Arc<EventPublisher<B>>,
    config: ScanLoopConfig,
    formats: Result<Arc<[BarcodeFormat]>, ScanError>,
    facing: Facing,
    active: Option<ActiveScan>,
}

impl<C, D, B> ScanLoop<C, D, B>
where
    C: CameraSource,
    D: Detector,
    B: EventBus<ScanEnvelope> + 'static,
{
    pub async fn new(
        camera: Arc<C>,
        detector: Arc<D>,
        inventory: Inventory,
        events: Arc<EventPublisher<B>>,
        config: ScanLoopConfig,
    ) -> Self {
        let formats = match probe(detector.as_ref()).await {
            Ok(formats) => Ok(Arc::from(formats)),
            Err(err) => {
                warn!(error = %err, "barcode detection unsupported, scanning disabled");
                events.publish(ScanEvent::DetectionUnsupported(DetectionUnsupported {
                    reason: err.to_string(),
                    occurred_at: Utc::now(),
                }));
                Err(err)
            }
        };

        Self {
            camera,
            detector,
            inventory,
            events,
            facing: config.facing,
            config,
            formats,
            active: None,
        }
    }

    pub fn state(&self) -> ScanState {
        match &self.active {
            Some(active) => ScanState::Active {
                facing: active.facing,
            },
            None => ScanState::Idle,
        }
    }

    /// Camera the next `start` opens (or the one in use while active).
    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Negotiated symbologies, `None` when detection is unsupported.
    pub fn formats(&self) -> Option<&[BarcodeFormat]> {
        self.formats.as_deref().ok()
    }

    pub fn is_supported(&self) -> bool {
        self.formats.is_ok()
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn config(&self) -> &ScanLoopConfig {
        &self.config
    }

    /// Acquire the camera and start polling.
    ///
    /// No-op while already active. Fails without touching the camera when the
    /// configuration is invalid or detection is unsupported. On camera failure
    /// the loop stays idle and a `CameraUnavailable` event is published.
    pub async fn start(&mut self) -> ScanResult<()> {
        if self.active.is_some() {
            debug!(facing = %self.facing, "scan loop already active");
            return Ok(());
        }

        self.config.validate()?;
        let formats = self.formats.clone()?;
        let facing = self.facing;

        let stream = match self.camera.open(facing).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(facing = %facing, error = %err, "failed to open camera");
                self.events
                    .publish(ScanEvent::CameraUnavailable(CameraUnavailable {
                        facing,
                        message: err.to_string(),
                        occurred_at: Utc::now(),
                    }));
                return Err(err.into());
            }
        };

        let lease = Arc::new(CameraLease::new(stream));
        let shutdown = Arc::new(Notify::new());

        self.events.publish(ScanEvent::ScanStarted(ScanStarted {
            facing,
            occurred_at: Utc::now(),
        }));

        let cycle = Cycle {
            lease: lease.clone(),
            detector: self.detector.clone(),
            inventory: self.inventory.clone(),
            events: self.events.clone(),
            formats,
            shutdown: shutdown.clone(),
            poll_interval: self.config.poll_interval,
        };
        let task = tokio::spawn(cycle.run());

        self.active = Some(ActiveScan {
            facing,
            lease,
            shutdown,
            task,
        });
        info!(facing = %facing, "scanning started");
        Ok(())
    }

    /// Stop polling and release the camera. Returns `false` if already idle.
    pub async fn stop(&mut self) -> bool {
        self.stop_with(StopReason::Requested).await
    }

    /// Stop, wait for the camera to settle, and restart on the other camera.
    ///
    /// While idle this only flips the facing used by the next `start`.
    pub async fn switch_camera(&mut self) -> ScanResult<()> {
        self.facing = self.facing.toggled();
        if self.active.is_none() {
            debug!(facing = %self.facing, "camera selection changed while idle");
            return Ok(());
        }

        self.stop_with(StopReason::CameraSwitch).await;
        time::sleep(self.config.switch_settle).await;
        self.start().await
    }

    async fn stop_with(&mut self, reason: StopReason) -> bool {
        let Some(active) = self.active.take() else {
            return false;
        };

        active.shutdown.notify_one();
        active.lease.release();
        if let Err(err) = active.task.await {
            warn!(error = %err, "scan task ended abnormally");
        }

        self.events.publish(ScanEvent::ScanStopped(ScanStopped {
            reason,
            occurred_at: Utc::now(),
        }));
        info!(facing = %active.facing, reason = ?reason, "scanning stopped");
        true
    }
}

impl<C, D, B> Drop for ScanLoop<C, D, B>
where
    C: CameraSource,
    D: Detector,
    B: EventBus<ScanEnvelope> + 'static,
{
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown.notify_one();
            active.lease.release();
            active.task.abort();
            self.events.publish(ScanEvent::ScanStopped(ScanStopped {
                reason: StopReason::Teardown,
                occurred_at: Utc::now(),
            }));
        }
    }
}

/// State owned by one running scan task.
struct Cycle<D, B> {
    lease: Arc<CameraLease>,
    detector: Arc<D>,
    inventory: Inventory,
    events: Arc<EventPublisher<B>>,
    formats: Arc<[BarcodeFormat]>,
    shutdown: Arc<Notify>,
    poll_interval: Duration,
}

impl<D, B> Cycle<D, B>
where
    D: Detector,
    B: EventBus<ScanEnvelope> + 'static,
{
    async fn run(self) {
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                _ = ticker.tick() => {}
            }

            let frame = match self.lease.capture() {
                Capture::Frame(frame) => {
                    trace!(
                        width = frame.width(),
                        height = frame.height(),
                        captured_at = %frame.captured_at(),
                        "frame captured"
                    );
                    frame
                }
                Capture::NotReady => {
                    trace!("no frame ready, skipping cycle");
                    continue;
                }
                Capture::Released => break,
            };

            // A detection still in flight at shutdown is dropped unapplied.
            let detected = tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                detected = self.detector.detect(frame, &self.formats) => detected,
            };

            match detected {
                Ok(symbols) => {
                    if let Some(first) = symbols.into_iter().next() {
                        self.handle_symbol(first);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "barcode detection failed");
                    self.events
                        .publish(ScanEvent::DetectionFailed(DetectionFailed {
                            message: err.to_string(),
                            occurred_at: Utc::now(),
                        }));
                }
            }
        }

        trace!("scan task exiting");
    }

    fn handle_symbol(&self, decoded: DecodedSymbol) {
        let DecodedSymbol { raw_value, format } = decoded;
        debug!(symbol = %raw_value, format = ?format, "symbol decoded");

        self.events.publish(ScanEvent::SymbolScanned(SymbolScanned {
            symbol: raw_value.clone(),
            format,
            occurred_at: Utc::now(),
        }));

        match self.inventory.match_symbol(&raw_value) {
            Some(item) => {
                info!(symbol = %raw_value, item_id = %item.id(), "item matched");
                self.events.publish(ScanEvent::ItemMatched(ItemMatched {
                    item_id: item.id().clone(),
                    symbol: raw_value,
                    title: item.title().map(str::to_owned),
                    occurred_at: Utc::now(),
                }));
            }
            None => {
                info!(symbol = %raw_value, "no match found");
                self.events.publish(ScanEvent::NoMatch(NoMatch {
                    symbol: raw_value,
                    occurred_at: Utc::now(),
                }));
            }
        }
    }
}
