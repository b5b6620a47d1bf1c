//! `shelfscan-scanner`
//!
//! **Responsibility:** turn a live camera feed into inventory matches.
//!
//! - [`camera`]: camera source/stream seam and the release-once lease
//! - [`detector`]: barcode detection seam, format negotiation, worker-backed
//!   production adapter and a scripted test double
//! - [`scan_loop`]: the cancellable polling loop (Idle ⇄ Active)

pub mod camera;
pub mod detector;
pub mod scan_loop;

pub use camera::{CameraError, CameraLease, CameraSource, CameraStream, Capture, Frame, ScriptedCamera};
pub use detector::{
    DecodedSymbol, Detector, DetectorError, FrameDecoder, ScriptedDetector, WorkerDetector, probe,
};
pub use scan_loop::{ScanLoop, ScanLoopConfig, ScanState};
