//! Barcode detection seam.
//!
//! Decoding pixels into symbols is the platform's job. This module only
//! defines what the scan loop needs from it, negotiates which symbologies to
//! ask for, and provides two implementations:
//!
//! - [`WorkerDetector`]: wraps a synchronous platform decoder and runs it on
//!   tokio's blocking pool, keeping the scan loop's scheduler free.
//! - [`ScriptedDetector`]: returns scripted per-cycle results for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use shelfscan_core::{BarcodeFormat, RETAIL_FORMATS, ScanError, ScanResult, negotiate_formats};

use crate::camera::Frame;

/// One symbol found in a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedSymbol {
    pub raw_value: String,
    pub format: Option<BarcodeFormat>,
}

impl DecodedSymbol {
    pub fn new(raw_value: impl Into<String>) -> Self {
        Self {
            raw_value: raw_value.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: BarcodeFormat) -> Self {
        self.format = Some(format);
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectorError {
    /// The capability does not exist on this platform.
    #[error("barcode detector unavailable: {0}")]
    Unavailable(String),

    /// A single frame could not be processed.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The isolated worker running the decoder failed (panicked, cancelled).
    #[error("detector worker failed: {0}")]
    Worker(String),
}

impl From<DetectorError> for ScanError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::Unavailable(msg) => ScanError::detection_unsupported(msg),
            other => ScanError::detection_transient(other.to_string()),
        }
    }
}

/// Platform barcode detection capability.
#[async_trait]
pub trait Detector: Send + Sync + 'static {
    /// Symbologies the platform can decode.
    async fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DetectorError>;

    /// Decode every symbol visible in `frame`, restricted to `formats`.
    ///
    /// An empty result is normal (nothing in view).
    async fn detect(
        &self,
        frame: Frame,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DecodedSymbol>, DetectorError>;
}

/// Query the detector once and pick the formats to scan for.
///
/// Fails with `DetectionUnsupported` when the query fails or none of the
/// retail formats is supported.
pub async fn probe<D>(detector: &D) -> ScanResult<Vec<BarcodeFormat>>
where
    D: Detector + ?Sized,
{
    let supported = detector
        .supported_formats()
        .await
        .map_err(|e| ScanError::detection_unsupported(e.to_string()))?;

    let formats = negotiate_formats(&supported);
    if formats.is_empty() {
        return Err(ScanError::detection_unsupported(format!(
            "none of the required formats ({}) is supported",
            RETAIL_FORMATS
                .iter()
                .map(|f| f.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    debug!(formats = ?formats, "barcode detector configured");
    Ok(formats)
}

/// Synchronous platform decoder (FFI binding, native library, ...).
///
/// Calls may block for the duration of a decode.
pub trait FrameDecoder: Send + Sync + 'static {
    fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DetectorError>;

    fn decode(
        &self,
        frame: &Frame,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DecodedSymbol>, DetectorError>;
}

/// Production detector: dispatches every decoder call to tokio's blocking pool.
#[derive(Debug)]
pub struct WorkerDetector<F> {
    decoder: Arc<F>,
}

impl<F> WorkerDetector<F>
where
    F: FrameDecoder,
{
    pub fn new(decoder: F) -> Self {
        Self {
            decoder: Arc::new(decoder),
        }
    }
}

#[async_trait]
impl<F> Detector for WorkerDetector<F>
where
    F: FrameDecoder,
{
    async fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DetectorError> {
        let decoder = self.decoder.clone();
        tokio::task::spawn_blocking(move || decoder.supported_formats())
            .await
            .map_err(|e| DetectorError::Worker(e.to_string()))?
    }

    async fn detect(
        &self,
        frame: Frame,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DecodedSymbol>, DetectorError> {
        let decoder = self.decoder.clone();
        let formats = formats.to_vec();
        tokio::task::spawn_blocking(move || decoder.decode(&frame, &formats))
            .await
            .map_err(|e| DetectorError::Worker(e.to_string()))?
    }
}

#[derive(Debug)]
enum ScriptStep {
    Symbols(Vec<DecodedSymbol>),
    Fail(DetectorError),
    /// Never resolves (a stalled platform call).
    Stall,
}

/// Test double: plays back one scripted step per `detect` call, then reports
/// empty frames forever.
#[derive(Debug)]
pub struct ScriptedDetector {
    formats: Result<Vec<BarcodeFormat>, DetectorError>,
    steps: Mutex<VecDeque<ScriptStep>>,
    latency: Option<Duration>,
    calls: AtomicUsize,
    format_queries: AtomicUsize,
    requested_formats: Mutex<Vec<BarcodeFormat>>,
}

impl Default for ScriptedDetector {
    fn default() -> Self {
        Self {
            formats: Ok(RETAIL_FORMATS.to_vec()),
            steps: Mutex::new(VecDeque::new()),
            latency: None,
            calls: AtomicUsize::new(0),
            format_queries: AtomicUsize::new(0),
            requested_formats: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedDetector {
    /// Supports every retail format; no script.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_formats(mut self, formats: impl Into<Vec<BarcodeFormat>>) -> Self {
        self.formats = Ok(formats.into());
        self
    }

    /// The capability is missing entirely.
    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.formats = Err(DetectorError::Unavailable(reason.into()));
        self
    }

    /// Every `detect` call takes this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Next cycle sees these symbols (in frame order).
    pub fn then_symbols<I, S>(self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols = symbols.into_iter().map(DecodedSymbol::new).collect();
        self.push(ScriptStep::Symbols(symbols))
    }

    pub fn then_decoded(self, symbols: Vec<DecodedSymbol>) -> Self {
        self.push(ScriptStep::Symbols(symbols))
    }

    /// Next cycle sees nothing.
    pub fn then_nothing(self) -> Self {
        self.push(ScriptStep::Symbols(Vec::new()))
    }

    /// Next cycle fails.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(ScriptStep::Fail(DetectorError::Decode(message.into())))
    }

    /// Next cycle never completes.
    pub fn then_stall(self) -> Self {
        self.push(ScriptStep::Stall)
    }

    /// Number of `detect` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of `supported_formats` queries so far.
    pub fn format_queries(&self) -> usize {
        self.format_queries.load(Ordering::SeqCst)
    }

    /// Formats passed to the most recent `detect` call.
    pub fn requested_formats(&self) -> Vec<BarcodeFormat> {
        self.requested_formats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(self, step: ScriptStep) -> Self {
        self.steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(step);
        self
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DetectorError> {
        self.format_queries.fetch_add(1, Ordering::SeqCst);
        self.formats.clone()
    }

    async fn detect(
        &self,
        _frame: Frame,
        formats: &[BarcodeFormat],
    ) -> Result<Vec<DecodedSymbol>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .requested_formats
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = formats.to_vec();

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let step = self
            .steps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match step {
            None => Ok(Vec::new()),
            Some(ScriptStep::Symbols(symbols)) => Ok(symbols),
            Some(ScriptStep::Fail(err)) => Err(err),
            Some(ScriptStep::Stall) => {
                warn!("scripted detector stalling");
                std::future::pending().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDecoder {
        formats: Vec<BarcodeFormat>,
        answer: Result<Vec<DecodedSymbol>, DetectorError>,
    }

    impl FrameDecoder for FixedDecoder {
        fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DetectorError> {
            Ok(self.formats.clone())
        }

        fn decode(
            &self,
            frame: &Frame,
            formats: &[BarcodeFormat],
        ) -> Result<Vec<DecodedSymbol>, DetectorError> {
            assert_eq!(frame.width(), 2);
            assert_eq!(formats, &[BarcodeFormat::Ean13]);
            self.answer.clone()
        }
    }

    struct PanickingDecoder;

    impl FrameDecoder for PanickingDecoder {
        fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DetectorError> {
            Ok(vec![BarcodeFormat::Ean13])
        }

        fn decode(&self, _: &Frame, _: &[BarcodeFormat]) -> Result<Vec<DecodedSymbol>, DetectorError> {
            panic!("decoder crashed");
        }
    }

    fn frame() -> Frame {
        Frame::new(2, 2, vec![0u8; 4])
    }

    #[tokio::test]
    async fn probe_negotiates_retail_formats() {
        let detector = ScriptedDetector::new().with_formats(vec![
            BarcodeFormat::QrCode,
            BarcodeFormat::Code128,
            BarcodeFormat::Ean8,
        ]);
        let formats = probe(&detector).await.unwrap();
        assert_eq!(formats, vec![BarcodeFormat::Ean8, BarcodeFormat::Code128]);
        assert_eq!(detector.format_queries(), 1);
    }

    #[tokio::test]
    async fn probe_rejects_detectors_without_retail_formats() {
        let detector = ScriptedDetector::new().with_formats(vec![BarcodeFormat::QrCode]);
        let err = probe(&detector).await.unwrap_err();
        assert!(matches!(err, ScanError::DetectionUnsupported(_)));
        assert!(!err.is_recoverable());

        let missing = ScriptedDetector::new().unavailable("no BarcodeDetector");
        let err = probe(&missing).await.unwrap_err();
        assert!(err.to_string().contains("no BarcodeDetector"));
    }

    #[tokio::test]
    async fn worker_detector_runs_decoder_off_the_async_thread() {
        let detector = WorkerDetector::new(FixedDecoder {
            formats: vec![BarcodeFormat::Ean13],
            answer: Ok(vec![
                DecodedSymbol::new("4901234567894").with_format(BarcodeFormat::Ean13),
            ]),
        });

        let formats = probe(&detector).await.unwrap();
        let symbols = detector.detect(frame(), &formats).await.unwrap();
        assert_eq!(symbols[0].raw_value, "4901234567894");
        assert_eq!(symbols[0].format, Some(BarcodeFormat::Ean13));
    }

    #[tokio::test]
    async fn worker_panics_surface_as_worker_errors() {
        let detector = WorkerDetector::new(PanickingDecoder);
        let err = detector
            .detect(frame(), &[BarcodeFormat::Ean13])
            .await
            .unwrap_err();
        assert!(matches!(err, DetectorError::Worker(_)));
        assert!(matches!(ScanError::from(err), ScanError::DetectionTransient(_)));
    }

    #[tokio::test]
    async fn script_plays_back_in_order_then_goes_quiet() {
        let detector = ScriptedDetector::new()
            .then_symbols(["A"])
            .then_fail("glare")
            .then_nothing();

        assert_eq!(
            detector.detect(frame(), &RETAIL_FORMATS).await.unwrap(),
            vec![DecodedSymbol::new("A")]
        );
        assert_eq!(
            detector.detect(frame(), &RETAIL_FORMATS).await.unwrap_err(),
            DetectorError::Decode("glare".to_string())
        );
        assert!(detector.detect(frame(), &RETAIL_FORMATS).await.unwrap().is_empty());
        assert!(detector.detect(frame(), &RETAIL_FORMATS).await.unwrap().is_empty());
        assert_eq!(detector.calls(), 4);
        assert_eq!(detector.requested_formats(), RETAIL_FORMATS.to_vec());
    }
}
