//! Camera access.

use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use shelfscan_core::{Facing, ScanError};

/// One still image taken from a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
            captured_at: Utc::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no {0} camera found")]
    NoDevice(Facing),

    #[error("camera busy: {0}")]
    Busy(String),

    #[error("camera error: {0}")]
    Other(String),
}

impl From<CameraError> for ScanError {
    fn from(err: CameraError) -> Self {
        ScanError::camera_unavailable(err.to_string())
    }
}

/// A live video stream holding a hardware lock on a camera.
pub trait CameraStream: Send {
    fn facing(&self) -> Facing;

    /// Whether the stream currently has enough data for a decodable frame.
    fn frame_ready(&self) -> bool;

    /// Grab the current frame. `None` when no frame is available.
    fn grab_frame(&mut self) -> Option<Frame>;

    /// Stop all tracks and give the device back.
    fn release(&mut self);
}

/// Platform camera access, parameterized by facing.
#[async_trait]
pub trait CameraSource: Send + Sync + 'static {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// Result of polling a leased stream for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Frame(Frame),
    /// The stream has no decodable frame yet (still warming up).
    NotReady,
    /// The lease was released; no more frames will come.
    Released,
}

/// Exclusive ownership of an open camera stream.
///
/// The stream is released exactly once: by the first [`release`](Self::release)
/// call, or on drop if nobody released it explicitly.
pub struct CameraLease {
    facing: Facing,
    stream: Mutex<Option<Box<dyn CameraStream>>>,
}

impl CameraLease {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self {
            facing: stream.facing(),
            stream: Mutex::new(Some(stream)),
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn capture(&self) -> Capture {
        let mut guard = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            None => Capture::Released,
            Some(stream) if !stream.frame_ready() => Capture::NotReady,
            Some(stream) => stream.grab_frame().map_or(Capture::NotReady, Capture::Frame),
        }
    }

    /// Release the camera. Returns `true` if this call did the release.
    pub fn release(&self) -> bool {
        let taken = self
            .stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match taken {
            Some(mut stream) => {
                stream.release();
                debug!(facing = %self.facing, "camera released");
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for CameraLease {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CameraLease")
            .field("facing", &self.facing)
            .field("released", &self.is_released())
            .finish()
    }
}

#[derive(Debug, Default)]
struct ScriptedCameraState {
    opens: AtomicUsize,
    releases: AtomicUsize,
    warmup_polls: AtomicUsize,
    failures: Mutex<VecDeque<CameraError>>,
    opened: Mutex<Vec<Facing>>,
}

/// In-memory camera for tests and demos.
///
/// Produces a blank frame on every poll once warmed up, fails the next opens
/// when told to, and counts opens/releases so tests can assert that no stream
/// leaks. Streams are *not* released on drop, so a missing release shows up as
/// `opens() > releases()`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCamera {
    state: Arc<ScriptedCameraState>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each opened stream reports "not ready" for its first `polls` polls.
    pub fn with_warmup(self, polls: usize) -> Self {
        self.state.warmup_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// Make the next `open` fail with `err` (queued; one failure per open).
    pub fn fail_next_open(&self, err: CameraError) {
        self.state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(err);
    }

    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet released.
    pub fn open_streams(&self) -> usize {
        self.opens() - self.releases()
    }

    /// Facings of every successful open, in order.
    pub fn opened_facings(&self) -> Vec<Facing> {
        self.state
            .opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CameraSource for ScriptedCamera {
    async fn open(&self, facing: Facing) -> Result<Box<dyn CameraStream>, CameraError> {
        let failure = self
            .state
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        self.state.opens.fetch_add(1, Ordering::SeqCst);
        self.state
            .opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(facing);

        Ok(Box::new(ScriptedStream {
            facing,
            warmup_left: Cell::new(self.state.warmup_polls.load(Ordering::SeqCst)),
            released: false,
            state: self.state.clone(),
        }))
    }
}

struct ScriptedStream {
    facing: Facing,
    warmup_left: Cell<usize>,
    released: bool,
    state: Arc<ScriptedCameraState>,
}

impl CameraStream for ScriptedStream {
    fn facing(&self) -> Facing {
        self.facing
    }

    fn frame_ready(&self) -> bool {
        if self.released {
            return false;
        }
        // Each readiness poll during warm-up counts as one skipped cycle.
        let left = self.warmup_left.get();
        if left > 0 {
            self.warmup_left.set(left - 1);
            return false;
        }
        true
    }

    fn grab_frame(&mut self) -> Option<Frame> {
        if self.released {
            return None;
        }
        Some(Frame::new(4, 4, vec![0u8; 16]))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.state.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}
