//! Virtual Keyboard Device
//!
//! Owns one uinput keyboard node registering every key in
//! [`KEY_TABLE`](crate::device::keycodes::KEY_TABLE). Key presses and releases
//! are queued by the caller and written one at a time by the worker, each
//! followed by its own SYN_REPORT so listeners observe discrete transitions.

use evdev::uinput::VirtualDeviceBuilder;
use evdev::{EventType, InputEvent, InputId, Key};
use std::io;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::device::backend::{BackendFactory, InputBackend, UinputBackend};
use crate::device::error::{DeviceError, Result};
use crate::device::keycodes::{key_name, supported_keys};
use crate::device::worker::{DeviceProtocol, DeviceState, DeviceStats, DeviceWorker, WorkerOptions};

/// Default product name
pub const KEYBOARD_DEVICE_NAME: &str = "Yogaboard-Virtual-Keyboard";

/// Key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Key went down
    Press,
    /// Key went up
    Release,
}

impl KeyAction {
    /// evdev value for EV_KEY
    pub fn value(&self) -> i32 {
        match self {
            KeyAction::Press => 1,
            KeyAction::Release => 0,
        }
    }
}

/// One queued key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Key code
    pub key: Key,
    /// Press or release
    pub action: KeyAction,
}

/// Anything that accepts key transitions
///
/// Implemented by [`VirtualKeyboard`]; the key press handler is written
/// against this so it can be driven without a device.
pub trait KeySink {
    /// Queue a press (`pressed = true`) or release
    fn send_key(&self, key: Key, pressed: bool);
}

struct KeyboardProtocol;

impl DeviceProtocol for KeyboardProtocol {
    type Event = KeyEvent;

    fn apply(&mut self, backend: &mut dyn InputBackend, event: KeyEvent) -> io::Result<()> {
        trace!(
            "keyboard: {:?} {}",
            event.action,
            key_name(event.key).unwrap_or("<unknown>")
        );
        backend.emit(&[InputEvent::new(
            EventType::KEY,
            event.key.code(),
            event.action.value(),
        )])
    }
}

/// Virtual keyboard backed by a dedicated worker thread
pub struct VirtualKeyboard {
    worker: DeviceWorker<KeyEvent>,
}

impl VirtualKeyboard {
    /// Create the uinput device on a new worker thread
    pub fn start(name: &str, options: WorkerOptions) -> Self {
        Self::with_backend(uinput_factory(name.to_string()), options)
    }

    /// Start with a custom backend (tests, dry runs)
    pub fn with_backend(factory: BackendFactory, options: WorkerOptions) -> Self {
        debug!("Starting virtual keyboard worker");
        Self {
            worker: DeviceWorker::spawn(KeyboardProtocol, factory, options),
        }
    }

    /// Queue a key transition
    ///
    /// Never blocks and never fails: a disabled or stopped device drops the
    /// event.
    pub fn send_key(&self, key: Key, pressed: bool) {
        let action = if pressed {
            KeyAction::Press
        } else {
            KeyAction::Release
        };

        match self.worker.submit(KeyEvent { key, action }) {
            Ok(()) => {}
            Err(DeviceError::Disabled) | Err(DeviceError::Stopped) => {
                debug!("keyboard unavailable, dropping {:?} {:?}", action, key);
            }
            Err(e) => warn!("keyboard: dropping {:?} {:?}: {}", action, key, e),
        }
    }

    /// Queue a press immediately followed by a release
    pub fn press_and_release(&self, key: Key) {
        self.send_key(key, true);
        self.send_key(key, false);
    }

    /// Lifecycle state
    pub fn state(&self) -> DeviceState {
        self.worker.state()
    }

    /// Event counters
    pub fn stats(&self) -> DeviceStats {
        self.worker.stats()
    }

    /// Wait until the queue has been written out
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.worker.wait_idle(timeout)
    }

    /// Stop the worker and release the device
    pub fn stop(&mut self) {
        self.worker.stop();
    }
}

impl KeySink for VirtualKeyboard {
    fn send_key(&self, key: Key, pressed: bool) {
        VirtualKeyboard::send_key(self, key, pressed);
    }
}

fn uinput_factory(name: String) -> BackendFactory {
    Box::new(move || create_uinput_keyboard(&name))
}

fn create_uinput_keyboard(name: &str) -> Result<Box<dyn InputBackend>> {
    let keys = supported_keys();
    let device = VirtualDeviceBuilder::new()
        .and_then(|builder| {
            builder
                .name(name)
                .input_id(InputId::new(evdev::BusType::BUS_USB, 0x1234, 0x5679, 1))
                .with_keys(&keys)
        })
        .and_then(|builder| builder.build())
        .map_err(|e| DeviceError::from_creation(name, e))?;

    Ok(Box::new(UinputBackend::new(device)))
}
