//! Device Worker Thread
//!
//! Each virtual device owns one dedicated worker thread and one bounded FIFO.
//! Producers (UI callbacks, the gesture engine) only `try_send` into the queue
//! and return immediately; the worker is the sole consumer and the sole owner
//! of the device handle.
//!
//! # Lifecycle
//!
//! ```text
//! spawn() ──> Starting ──factory ok──> Running ──stop()──> Stopped
//!                 │
//!                 └──factory err──> Disabled (permanent, sends are no-ops)
//! ```
//!
//! The handle lives in a shared slot so that `stop()` can release it if the
//! worker does not finish within the shutdown timeout. Whoever takes it out of
//! the slot first drops it, so it is released exactly once.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

use crate::device::backend::{BackendFactory, InputBackend};
use crate::device::error::{DeviceError, Result};

/// Translates queued device events into low-level writes
///
/// Implementations run on the worker thread only.
pub trait DeviceProtocol: Send + 'static {
    /// Queued event type
    type Event: Send + 'static;

    /// Apply one queued event to the device
    fn apply(&mut self, backend: &mut dyn InputBackend, event: Self::Event) -> io::Result<()>;

    /// Bring the device to a neutral state before the handle is released
    fn shutdown(&mut self, _backend: &mut dyn InputBackend) -> io::Result<()> {
        Ok(())
    }
}

/// Lifecycle state of a virtual device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceState {
    /// Worker started, device not yet registered
    Starting = 0,
    /// Device registered and processing events
    Running = 1,
    /// Registration failed; permanently inert
    Disabled = 2,
    /// Worker stopped and handle released
    Stopped = 3,
}

impl DeviceState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DeviceState::Starting,
            1 => DeviceState::Running,
            2 => DeviceState::Disabled,
            _ => DeviceState::Stopped,
        }
    }

    /// Whether events submitted now can still reach the device
    pub fn accepts_events(&self) -> bool {
        matches!(self, DeviceState::Starting | DeviceState::Running)
    }
}

/// Worker tuning
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Thread name
    pub thread_name: String,
    /// How long an idle worker waits before re-checking the running flag
    pub poll_interval: Duration,
    /// Upper bound on waiting for the worker in `stop()`
    pub shutdown_timeout: Duration,
    /// Pause after device creation so udev can pick up the node
    pub settle_delay: Duration,
    /// Queue capacity; further events are dropped
    pub queue_capacity: usize,
}

impl WorkerOptions {
    /// Defaults for a worker with the given thread name
    pub fn named(thread_name: impl Into<String>) -> Self {
        Self {
            thread_name: thread_name.into(),
            poll_interval: Duration::from_millis(1),
            shutdown_timeout: Duration::from_secs(1),
            settle_delay: Duration::from_millis(100),
            queue_capacity: 4096,
        }
    }
}

/// Event counters for one device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Events accepted into the queue
    pub submitted: u64,
    /// Events applied to the device
    pub processed: u64,
    /// Events whose write failed (dropped, not retried)
    pub write_errors: u64,
    /// Events rejected because the queue was full
    pub dropped: u64,
}

struct Shared {
    running: AtomicBool,
    state: AtomicU8,
    submitted: AtomicU64,
    processed: AtomicU64,
    write_errors: AtomicU64,
    dropped: AtomicU64,
}

impl Shared {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            state: AtomicU8::new(DeviceState::Starting as u8),
            submitted: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn state(&self) -> DeviceState {
        DeviceState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: DeviceState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move to `next` unless the device is already disabled
    fn transition(&self, next: DeviceState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != DeviceState::Disabled as u8).then_some(next as u8)
            });
    }

    fn settled(&self) -> u64 {
        self.processed.load(Ordering::Acquire) + self.write_errors.load(Ordering::Acquire)
    }
}

type HandleSlot = Arc<Mutex<Option<Box<dyn InputBackend>>>>;

/// Queue plus dedicated worker thread for one virtual device
pub struct DeviceWorker<E: Send + 'static> {
    label: String,
    sender: Option<Sender<E>>,
    shared: Arc<Shared>,
    handle: HandleSlot,
    thread: Option<JoinHandle<()>>,
    done_rx: Receiver<()>,
    shutdown_timeout: Duration,
}

impl<E: Send + 'static> DeviceWorker<E> {
    /// Start the worker thread
    ///
    /// Never fails: if the thread cannot be spawned the device is disabled.
    /// Device creation runs on the worker thread via `factory`.
    pub fn spawn<P>(protocol: P, factory: BackendFactory, options: WorkerOptions) -> Self
    where
        P: DeviceProtocol<Event = E>,
    {
        let (sender, receiver) = bounded::<E>(options.queue_capacity.max(1));
        let (done_tx, done_rx) = bounded::<()>(1);
        let shared = Arc::new(Shared::new());
        let handle: HandleSlot = Arc::new(Mutex::new(None));

        let label = options.thread_name.clone();
        let thread = {
            let shared = Arc::clone(&shared);
            let handle = Arc::clone(&handle);
            let options = options.clone();
            thread::Builder::new()
                .name(options.thread_name.clone())
                .spawn(move || {
                    run_worker(protocol, factory, receiver, shared, handle, options);
                    let _ = done_tx.send(());
                })
        };

        let thread = match thread {
            Ok(thread) => {
                debug!("{}: worker thread started", label);
                Some(thread)
            }
            Err(e) => {
                error!("{}: {}", label, DeviceError::ThreadSpawnFailed(e));
                shared.set_state(DeviceState::Disabled);
                None
            }
        };

        Self {
            label,
            sender: Some(sender),
            shared,
            handle,
            thread,
            done_rx,
            shutdown_timeout: options.shutdown_timeout,
        }
    }

    /// Enqueue an event without blocking
    pub fn submit(&self, event: E) -> Result<()> {
        match self.state() {
            DeviceState::Disabled => return Err(DeviceError::Disabled),
            DeviceState::Stopped => return Err(DeviceError::Stopped),
            DeviceState::Starting | DeviceState::Running => {}
        }

        let sender = self.sender.as_ref().ok_or(DeviceError::Stopped)?;
        match sender.try_send(event) {
            Ok(()) => {
                self.shared.submitted.fetch_add(1, Ordering::AcqRel);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                Err(DeviceError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(DeviceError::Stopped),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> DeviceState {
        self.shared.state()
    }

    /// Events waiting in the queue
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Counter snapshot
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            submitted: self.shared.submitted.load(Ordering::Acquire),
            processed: self.shared.processed.load(Ordering::Acquire),
            write_errors: self.shared.write_errors.load(Ordering::Acquire),
            dropped: self.shared.dropped.load(Ordering::Acquire),
        }
    }

    /// Wait until every submitted event has been applied
    ///
    /// Returns false on timeout or if the device cannot make progress.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.shared.settled() >= self.shared.submitted.load(Ordering::Acquire) {
                return true;
            }
            if !self.state().accepts_events() || Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stop the worker and release the device handle
    ///
    /// Queued events are drained first. Safe to call more than once.
    pub fn stop(&mut self) {
        if self.sender.is_none() && self.thread.is_none() {
            return;
        }

        debug!("{}: stopping worker", self.label);
        self.shared.running.store(false, Ordering::Release);
        self.sender = None;

        let finished = match self.done_rx.recv_timeout(self.shutdown_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => false,
        };

        if let Some(thread) = self.thread.take() {
            if finished {
                if thread.join().is_err() {
                    error!("{}: worker thread panicked", self.label);
                }
            } else {
                warn!(
                    "{}: worker did not stop within {:?}, releasing device",
                    self.label, self.shutdown_timeout
                );
            }
        }

        // Only reached with a handle when the worker never released it
        match self.handle.try_lock_for(self.shutdown_timeout) {
            Some(mut slot) => {
                if slot.take().is_some() {
                    warn!("{}: device handle released by stop()", self.label);
                }
            }
            None => error!("{}: device handle still busy, leaving it to the worker", self.label),
        }

        self.shared.transition(DeviceState::Stopped);
        info!("{}: stopped", self.label);
    }
}

impl<E: Send + 'static> Drop for DeviceWorker<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker<P: DeviceProtocol>(
    mut protocol: P,
    factory: BackendFactory,
    receiver: Receiver<P::Event>,
    shared: Arc<Shared>,
    handle: HandleSlot,
    options: WorkerOptions,
) {
    let label = options.thread_name;

    let backend = match factory() {
        Ok(backend) => backend,
        Err(e) => {
            error!("{}: {}", label, e);
            if matches!(e, DeviceError::PermissionDenied(_)) {
                error!("Make sure you have permission to write /dev/uinput");
                error!("Run: sudo usermod -a -G input $USER");
            }
            shared.set_state(DeviceState::Disabled);
            // Events queued before the failure are discarded with the receiver
            return;
        }
    };

    *handle.lock() = Some(backend);
    shared.transition(DeviceState::Running);
    info!("{}: device created", label);

    if !options.settle_delay.is_zero() {
        thread::sleep(options.settle_delay);
    }

    loop {
        match receiver.recv_timeout(options.poll_interval) {
            Ok(event) => {
                let mut slot = handle.lock();
                let Some(backend) = slot.as_mut() else {
                    warn!("{}: device handle gone, exiting", label);
                    break;
                };

                match protocol.apply(backend.as_mut(), event) {
                    Ok(()) => {
                        shared.processed.fetch_add(1, Ordering::AcqRel);
                    }
                    Err(e) => {
                        shared.write_errors.fetch_add(1, Ordering::AcqRel);
                        warn!("{}: {}", label, DeviceError::WriteFailed(e));
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !shared.running.load(Ordering::Acquire) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                trace!("{}: queue closed", label);
                break;
            }
        }
    }

    if let Some(mut backend) = handle.lock().take() {
        if let Err(e) = protocol.shutdown(backend.as_mut()) {
            warn!("{}: failed to reset device on shutdown: {}", label, e);
        }
        drop(backend);
        debug!("{}: device handle released", label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::backend::{RecordedEvent, RecordingBackend};
    use evdev::{EventType, InputEvent};

    struct EchoProtocol;

    impl DeviceProtocol for EchoProtocol {
        type Event = u16;

        fn apply(&mut self, backend: &mut dyn InputBackend, code: u16) -> io::Result<()> {
            backend.emit(&[InputEvent::new(EventType::KEY, code, 1)])
        }

        fn shutdown(&mut self, backend: &mut dyn InputBackend) -> io::Result<()> {
            backend.emit(&[InputEvent::new(EventType::KEY, 999, 0)])
        }
    }

    fn fast_options() -> WorkerOptions {
        WorkerOptions {
            settle_delay: Duration::ZERO,
            ..WorkerOptions::named("test-worker")
        }
    }

    fn failing_factory() -> BackendFactory {
        Box::new(|| {
            Err(DeviceError::PermissionDenied(
                "Permission denied (os error 13)".to_string(),
            ))
        })
    }

    fn wait_for_state<E: Send + 'static>(worker: &DeviceWorker<E>, state: DeviceState) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if worker.state() == state {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_events_delivered_in_order() {
        let recorder = RecordingBackend::new();
        let worker = DeviceWorker::spawn(EchoProtocol, recorder.factory(), fast_options());

        for code in 1..=50u16 {
            worker.submit(code).unwrap();
        }
        assert!(worker.wait_idle(Duration::from_secs(2)));

        let codes: Vec<u16> = recorder
            .events()
            .into_iter()
            .filter(|e| !e.is_syn())
            .map(|e| e.code)
            .collect();
        assert_eq!(codes, (1..=50).collect::<Vec<_>>());
        assert_eq!(worker.state(), DeviceState::Running);
    }

    #[test]
    fn test_stop_drains_queue_and_runs_shutdown() {
        let recorder = RecordingBackend::new();
        let mut worker = DeviceWorker::spawn(EchoProtocol, recorder.factory(), fast_options());

        worker.submit(7).unwrap();
        worker.stop();

        let events = recorder.events();
        assert_eq!(events.first(), Some(&RecordedEvent::new(EventType::KEY.0, 7, 1)));
        assert_eq!(
            events.iter().rev().nth(1),
            Some(&RecordedEvent::new(EventType::KEY.0, 999, 0))
        );
        assert_eq!(worker.state(), DeviceState::Stopped);
        assert!(matches!(worker.submit(8), Err(DeviceError::Stopped)));
    }

    #[test]
    fn test_factory_failure_disables_device() {
        let mut worker = DeviceWorker::spawn(EchoProtocol, failing_factory(), fast_options());

        assert!(wait_for_state(&worker, DeviceState::Disabled));
        assert!(matches!(worker.submit(1), Err(DeviceError::Disabled)));

        worker.stop();
        assert_eq!(worker.state(), DeviceState::Disabled);
        assert!(worker.handle.lock().is_none());
        assert!(worker.thread.is_none());
    }

    #[test]
    fn test_write_failure_does_not_stall_worker() {
        let recorder = RecordingBackend::new();
        recorder.fail_next_writes(1);
        let worker = DeviceWorker::spawn(EchoProtocol, recorder.factory(), fast_options());

        worker.submit(1).unwrap();
        worker.submit(2).unwrap();
        assert!(worker.wait_idle(Duration::from_secs(2)));

        let stats = worker.stats();
        assert_eq!(stats.write_errors, 1);
        assert_eq!(stats.processed, 1);
        assert_eq!(recorder.events()[0], RecordedEvent::new(EventType::KEY.0, 2, 1));
    }

    #[test]
    fn test_full_queue_drops_events() {
        let recorder = RecordingBackend::new();
        let options = WorkerOptions {
            queue_capacity: 1,
            settle_delay: Duration::from_millis(200),
            ..WorkerOptions::named("test-full")
        };
        let worker = DeviceWorker::spawn(EchoProtocol, recorder.factory(), options);

        // The worker is still settling, so the single slot fills up
        let results: Vec<_> = (0..5).map(|code| worker.submit(code)).collect();
        assert!(results.iter().any(|r| matches!(r, Err(DeviceError::QueueFull))));
        assert!(worker.stats().dropped > 0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let recorder = RecordingBackend::new();
        let mut worker = DeviceWorker::spawn(EchoProtocol, recorder.factory(), fast_options());
        worker.stop();
        worker.stop();
        assert_eq!(worker.state(), DeviceState::Stopped);
    }
}
