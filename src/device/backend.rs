//! Device Backends
//!
//! A backend is the owned handle the worker thread writes to. The production
//! backend wraps an evdev uinput [`VirtualDevice`]; [`RecordingBackend`] keeps
//! the event stream in memory for tests and `--dry-run`.

use evdev::uinput::VirtualDevice;
use evdev::{EventType, InputEvent};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::device::error::Result;

/// Sink for low-level input events
///
/// Every call writes `events` in order and then terminates them with a
/// SYN_REPORT, committing them as one input report.
pub trait InputBackend: Send {
    /// Write a report
    fn emit(&mut self, events: &[InputEvent]) -> io::Result<()>;
}

/// Constructor run on the worker thread to open the device handle
pub type BackendFactory = Box<dyn FnOnce() -> Result<Box<dyn InputBackend>> + Send>;

/// uinput device node
pub struct UinputBackend {
    device: VirtualDevice,
}

impl UinputBackend {
    /// Wrap a created virtual device
    pub fn new(device: VirtualDevice) -> Self {
        Self { device }
    }
}

impl InputBackend for UinputBackend {
    fn emit(&mut self, events: &[InputEvent]) -> io::Result<()> {
        // VirtualDevice::emit appends SYN_REPORT itself
        self.device.emit(events)
    }
}

/// One recorded low-level event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordedEvent {
    /// Event type (EV_KEY, EV_ABS, ...)
    pub kind: u16,
    /// Event code
    pub code: u16,
    /// Event value
    pub value: i32,
}

impl RecordedEvent {
    /// Build a recorded event
    pub const fn new(kind: u16, code: u16, value: i32) -> Self {
        Self { kind, code, value }
    }

    /// The SYN_REPORT marker
    pub const fn syn() -> Self {
        Self::new(EventType::SYNCHRONIZATION.0, 0, 0)
    }

    /// Whether this is a SYN_REPORT marker
    pub fn is_syn(&self) -> bool {
        self.kind == EventType::SYNCHRONIZATION.0 && self.code == 0
    }
}

impl From<&InputEvent> for RecordedEvent {
    fn from(event: &InputEvent) -> Self {
        Self::new(event.event_type().0, event.code(), event.value())
    }
}

/// In-memory backend recording the exact event stream
///
/// Clones share the same log, so a test keeps one handle while the worker
/// owns the other.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
    failures: Arc<AtomicUsize>,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail with an I/O error
    pub fn fail_next_writes(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Snapshot of everything written so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events, including SYN markers
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Number of committed reports
    pub fn report_count(&self) -> usize {
        self.events.lock().iter().filter(|e| e.is_syn()).count()
    }

    /// Recorded events split into reports (SYN markers removed)
    pub fn reports(&self) -> Vec<Vec<RecordedEvent>> {
        let events = self.events.lock();
        let mut reports = Vec::new();
        let mut current = Vec::new();
        for event in events.iter() {
            if event.is_syn() {
                reports.push(std::mem::take(&mut current));
            } else {
                current.push(*event);
            }
        }
        reports
    }

    /// Boxed factory handing a clone of this recorder to a worker
    pub fn factory(&self) -> BackendFactory {
        let backend = self.clone();
        Box::new(move || Ok(Box::new(backend) as Box<dyn InputBackend>))
    }
}

impl InputBackend for RecordingBackend {
    fn emit(&mut self, events: &[InputEvent]) -> io::Result<()> {
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::Other, "injected write failure"));
        }

        let mut log = self.events.lock();
        log.extend(events.iter().map(RecordedEvent::from));
        log.push(RecordedEvent::syn());
        Ok(())
    }
}
