use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use shelfscan_events::{Event, EventEnvelope, Projection, ScanEvent, StopReason};

/// One rendered activity log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub sequence_number: u64,
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Rolling, human-readable log of what the scanner did (newest last).
///
/// Holds at most `capacity` lines; older lines fall off the front.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    capacity: usize,
    lines: VecDeque<LogLine>,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(10)
    }
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            lines: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &LogLine> {
        self.lines.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.message.as_str()).collect()
    }

    fn push(&mut self, line: LogLine) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

/// Log line for an event, if the event is worth showing.
pub fn describe(event: &ScanEvent) -> Option<String> {
    let message = match event {
        ScanEvent::ScanStarted(_) => "Scanning started".to_string(),
        ScanEvent::ScanStopped(e) => match e.reason {
            StopReason::CameraSwitch => "Scanning stopped (switching camera)".to_string(),
            StopReason::Requested | StopReason::Teardown => "Scanning stopped".to_string(),
        },
        // Reported together with its match outcome.
        ScanEvent::SymbolScanned(_) => return None,
        ScanEvent::ItemMatched(e) => {
            let label = e
                .title
                .clone()
                .unwrap_or_else(|| e.item_id.to_string());
            format!("Scanned: {} - Matched: {}", e.symbol, label)
        }
        ScanEvent::NoMatch(e) => format!("Scanned: {} - No match found", e.symbol),
        ScanEvent::DetectionFailed(e) => format!("Error: {}", e.message),
        ScanEvent::CameraUnavailable(e) => format!("Camera error: {}", e.message),
        ScanEvent::DetectionUnsupported(_) => {
            "Barcode detection is not supported on this device".to_string()
        }
        ScanEvent::CatalogLoaded(e) => format!("Loaded {} items", e.item_count),
        ScanEvent::CatalogUnavailable(e) => format!("Failed to load catalog: {}", e.message),
    };
    Some(message)
}

impl Projection for ActivityLog {
    type Ev = ScanEvent;

    fn apply(&mut self, envelope: &EventEnvelope<ScanEvent>) {
        let event = envelope.payload();
        if let Some(message) = describe(event) {
            self.push(LogLine {
                sequence_number: envelope.sequence_number(),
                at: event.occurred_at(),
                message,
            });
        }
    }
}
