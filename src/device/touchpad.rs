//! Virtual Multi-Touch Touchpad Device
//!
//! Owns one uinput node that reports like a clickpad: multi-touch slots
//! (protocol type B), touch/tool flags, left/middle/right buttons, plus
//! relative pointer and wheel axes used by the gesture engine.
//!
//! # Event protocol
//!
//! ```text
//! touch_down(slot, id, x, y)   [ABS_MT_SLOT slot] ABS_MT_TRACKING_ID id
//!                              ABS_MT_POSITION_X x  ABS_MT_POSITION_Y y
//! touch_move(slot, x, y)       [ABS_MT_SLOT slot] ABS_MT_POSITION_X/Y
//! touch_up(slot)               [ABS_MT_SLOT slot] ABS_MT_TRACKING_ID -1
//! set_finger_count(n)          BTN_TOUCH, BTN_TOOL_FINGER..BTN_TOOL_QUADTAP
//! click(button, pressed)       BTN_LEFT | BTN_MIDDLE | BTN_RIGHT
//! pointer_motion(dx, dy)       REL_X, REL_Y
//! scroll(h, v)                 REL_HWHEEL(_HI_RES), REL_WHEEL(_HI_RES)
//! sync()                       SYN_REPORT
//! ```
//!
//! The slot select is written only when the device's current slot differs.
//! Events written between two syncs are committed as a single report.

use evdev::uinput::VirtualDeviceBuilder;
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key,
    PropType, RelativeAxisType, UinputAbsSetup,
};
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::device::backend::{BackendFactory, InputBackend, UinputBackend};
use crate::device::error::{DeviceError, Result};
use crate::device::worker::{DeviceProtocol, DeviceState, DeviceStats, DeviceWorker, WorkerOptions};

/// Default product name
pub const TOUCHPAD_DEVICE_NAME: &str = "Yogaboard-Virtual-Touchpad";

/// Simultaneous contacts the device reports
pub const MAX_SLOTS: usize = 10;

/// Largest device X coordinate
pub const DEVICE_MAX_X: i32 = 500;

/// Largest device Y coordinate
pub const DEVICE_MAX_Y: i32 = 500;

/// Largest tracking ID before wrapping
pub const MAX_TRACKING_ID: u16 = u16::MAX;

/// Hi-res wheel units per detent
const WHEEL_HI_RES_PER_DETENT: i32 = 120;

/// Physical buttons of the touchpad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Middle button
    Middle,
    /// Secondary button
    Right,
}

impl MouseButton {
    /// All buttons, in code order
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    /// Linux button code
    pub fn key(&self) -> Key {
        match self {
            MouseButton::Left => Key::BTN_LEFT,
            MouseButton::Right => Key::BTN_RIGHT,
            MouseButton::Middle => Key::BTN_MIDDLE,
        }
    }

    fn index(&self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Right => 1,
            MouseButton::Middle => 2,
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "middle" => Ok(MouseButton::Middle),
            "right" => Ok(MouseButton::Right),
            other => Err(format!("unknown button '{}'", other)),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MouseButton::Left => "left",
            MouseButton::Middle => "middle",
            MouseButton::Right => "right",
        };
        f.write_str(name)
    }
}

/// One queued touchpad action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEvent {
    /// Contact starts in a slot
    Down {
        /// Slot number
        slot: u8,
        /// Tracking ID for the contact
        tracking_id: u16,
        /// Device X
        x: i32,
        /// Device Y
        y: i32,
    },
    /// Contact moves
    Move {
        /// Slot number
        slot: u8,
        /// Device X
        x: i32,
        /// Device Y
        y: i32,
    },
    /// Contact lifts
    Up {
        /// Slot number
        slot: u8,
    },
    /// Number of fingers on the surface
    FingerCount(u8),
    /// Button press or release
    Button {
        /// Button
        button: MouseButton,
        /// Pressed or released
        pressed: bool,
    },
    /// Relative pointer motion
    PointerMotion {
        /// Horizontal delta
        dx: i32,
        /// Vertical delta
        dy: i32,
    },
    /// Wheel motion in detents
    Scroll {
        /// Horizontal detents (positive = right)
        horizontal: i32,
        /// Vertical detents (positive = up/forward)
        vertical: i32,
    },
    /// Commit the pending report
    Sync,
}

/// Semantic touchpad operations
///
/// Implemented by [`VirtualTouchpad`]; the gesture engine drives this trait.
/// All operations only enqueue work.
pub trait TouchpadSink {
    /// Start a contact
    fn touch_down(&self, slot: u8, tracking_id: u16, x: i32, y: i32);
    /// Move a contact
    fn touch_move(&self, slot: u8, x: i32, y: i32);
    /// End a contact
    fn touch_up(&self, slot: u8);
    /// Report the number of fingers on the surface
    fn set_finger_count(&self, count: usize);
    /// Press or release a button
    fn click(&self, button: MouseButton, pressed: bool);
    /// Move the pointer
    fn pointer_motion(&self, dx: i32, dy: i32);
    /// Scroll by whole detents
    fn scroll(&self, horizontal: i32, vertical: i32);
    /// Commit everything since the previous sync
    fn sync(&self);

    /// Press, sync, release, sync
    fn tap(&self, button: MouseButton) {
        self.click(button, true);
        self.sync();
        self.click(button, false);
        self.sync();
    }
}

/// Device state as the kernel last saw it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Committed {
    current_slot: u8,
    active_slots: BTreeSet<u8>,
    finger_count: u8,
    buttons: [bool; 3],
}

/// Device-side state, owned by the worker thread
struct TouchpadProtocol {
    current_slot: u8,
    active_slots: BTreeSet<u8>,
    finger_count: u8,
    buttons: [bool; 3],
    pending: Vec<InputEvent>,
    committed: Committed,
}

impl TouchpadProtocol {
    fn new() -> Self {
        Self {
            // The kernel starts every MT device on slot 0
            current_slot: 0,
            active_slots: BTreeSet::new(),
            finger_count: 0,
            buttons: [false; 3],
            pending: Vec::with_capacity(32),
            committed: Committed {
                current_slot: 0,
                active_slots: BTreeSet::new(),
                finger_count: 0,
                buttons: [false; 3],
            },
        }
    }

    fn write(&mut self, kind: EventType, code: u16, value: i32) {
        self.pending.push(InputEvent::new(kind, code, value));
    }

    fn abs(&mut self, axis: AbsoluteAxisType, value: i32) {
        self.write(EventType::ABSOLUTE, axis.0, value);
    }

    fn key(&mut self, key: Key, on: bool) {
        self.write(EventType::KEY, key.code(), on as i32);
    }

    fn select_slot(&mut self, slot: u8) {
        if self.current_slot != slot {
            self.abs(AbsoluteAxisType::ABS_MT_SLOT, slot as i32);
            self.current_slot = slot;
        }
    }

    fn finger_flags(&mut self, count: u8) {
        self.finger_count = count;
        self.key(Key::BTN_TOUCH, count > 0);
        self.key(Key::BTN_TOOL_FINGER, count == 1);
        self.key(Key::BTN_TOOL_DOUBLETAP, count == 2);
        self.key(Key::BTN_TOOL_TRIPLETAP, count == 3);
        self.key(Key::BTN_TOOL_QUADTAP, count >= 4);
    }

    fn commit(&mut self, backend: &mut dyn InputBackend) -> io::Result<()> {
        let result = backend.emit(&self.pending);
        // A failed report is dropped, never retried
        self.pending.clear();

        match &result {
            Ok(()) => {
                self.committed = Committed {
                    current_slot: self.current_slot,
                    active_slots: self.active_slots.clone(),
                    finger_count: self.finger_count,
                    buttons: self.buttons,
                };
            }
            Err(_) => {
                // The kernel never saw the dropped report
                let committed = self.committed.clone();
                self.current_slot = committed.current_slot;
                self.active_slots = committed.active_slots;
                self.finger_count = committed.finger_count;
                self.buttons = committed.buttons;
            }
        }
        result
    }
}

impl DeviceProtocol for TouchpadProtocol {
    type Event = TouchEvent;

    fn apply(&mut self, backend: &mut dyn InputBackend, event: TouchEvent) -> io::Result<()> {
        trace!("touchpad: {:?}", event);
        match event {
            TouchEvent::Down {
                slot,
                tracking_id,
                x,
                y,
            } => {
                self.select_slot(slot);
                self.abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, tracking_id as i32);
                self.abs(AbsoluteAxisType::ABS_MT_POSITION_X, x);
                self.abs(AbsoluteAxisType::ABS_MT_POSITION_Y, y);
                self.active_slots.insert(slot);
            }
            TouchEvent::Move { slot, x, y } => {
                self.select_slot(slot);
                self.abs(AbsoluteAxisType::ABS_MT_POSITION_X, x);
                self.abs(AbsoluteAxisType::ABS_MT_POSITION_Y, y);
            }
            TouchEvent::Up { slot } => {
                self.select_slot(slot);
                self.abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1);
                self.active_slots.remove(&slot);
            }
            TouchEvent::FingerCount(count) => self.finger_flags(count),
            TouchEvent::Button { button, pressed } => {
                self.buttons[button.index()] = pressed;
                self.key(button.key(), pressed);
            }
            TouchEvent::PointerMotion { dx, dy } => {
                if dx != 0 {
                    self.write(EventType::RELATIVE, RelativeAxisType::REL_X.0, dx);
                }
                if dy != 0 {
                    self.write(EventType::RELATIVE, RelativeAxisType::REL_Y.0, dy);
                }
            }
            TouchEvent::Scroll {
                horizontal,
                vertical,
            } => {
                if vertical != 0 {
                    self.write(EventType::RELATIVE, RelativeAxisType::REL_WHEEL.0, vertical);
                    self.write(
                        EventType::RELATIVE,
                        RelativeAxisType::REL_WHEEL_HI_RES.0,
                        vertical * WHEEL_HI_RES_PER_DETENT,
                    );
                }
                if horizontal != 0 {
                    self.write(EventType::RELATIVE, RelativeAxisType::REL_HWHEEL.0, horizontal);
                    self.write(
                        EventType::RELATIVE,
                        RelativeAxisType::REL_HWHEEL_HI_RES.0,
                        horizontal * WHEEL_HI_RES_PER_DETENT,
                    );
                }
            }
            TouchEvent::Sync => return self.commit(backend),
        }
        Ok(())
    }

    fn shutdown(&mut self, backend: &mut dyn InputBackend) -> io::Result<()> {
        let slots: Vec<u8> = self.active_slots.iter().copied().collect();
        for slot in slots {
            self.select_slot(slot);
            self.abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1);
        }
        self.active_slots.clear();

        for button in MouseButton::ALL {
            if self.buttons[button.index()] {
                self.buttons[button.index()] = false;
                self.key(button.key(), false);
            }
        }

        self.finger_flags(0);
        self.commit(backend)
    }
}

/// Virtual touchpad backed by a dedicated worker thread
pub struct VirtualTouchpad {
    worker: DeviceWorker<TouchEvent>,
}

impl VirtualTouchpad {
    /// Create the uinput device on a new worker thread
    pub fn start(name: &str, options: WorkerOptions) -> Self {
        Self::with_backend(uinput_factory(name.to_string()), options)
    }

    /// Start with a custom backend (tests, dry runs)
    pub fn with_backend(factory: BackendFactory, options: WorkerOptions) -> Self {
        debug!("Starting virtual touchpad worker");
        Self {
            worker: DeviceWorker::spawn(TouchpadProtocol::new(), factory, options),
        }
    }

    fn enqueue(&self, event: TouchEvent) {
        match self.worker.submit(event) {
            Ok(()) => {}
            Err(DeviceError::Disabled) | Err(DeviceError::Stopped) => {
                trace!("touchpad unavailable, dropping {:?}", event);
            }
            Err(e) => warn!("touchpad: dropping {:?}: {}", event, e),
        }
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

    /// Stop the worker, lift all contacts and release the device
    pub fn stop(&mut self) {
        self.worker.stop();
    }
}

impl TouchpadSink for VirtualTouchpad {
    fn touch_down(&self, slot: u8, tracking_id: u16, x: i32, y: i32) {
        self.enqueue(TouchEvent::Down {
            slot,
            tracking_id,
            x: x.clamp(0, DEVICE_MAX_X),
            y: y.clamp(0, DEVICE_MAX_Y),
        });
    }

    fn touch_move(&self, slot: u8, x: i32, y: i32) {
        self.enqueue(TouchEvent::Move {
            slot,
            x: x.clamp(0, DEVICE_MAX_X),
            y: y.clamp(0, DEVICE_MAX_Y),
        });
    }

    fn touch_up(&self, slot: u8) {
        self.enqueue(TouchEvent::Up { slot });
    }

    fn set_finger_count(&self, count: usize) {
        self.enqueue(TouchEvent::FingerCount(count.min(u8::MAX as usize) as u8));
    }

    fn click(&self, button: MouseButton, pressed: bool) {
        self.enqueue(TouchEvent::Button { button, pressed });
    }

    fn pointer_motion(&self, dx: i32, dy: i32) {
        if dx != 0 || dy != 0 {
            self.enqueue(TouchEvent::PointerMotion { dx, dy });
        }
    }

    fn scroll(&self, horizontal: i32, vertical: i32) {
        if horizontal != 0 || vertical != 0 {
            self.enqueue(TouchEvent::Scroll {
                horizontal,
                vertical,
            });
        }
    }

    fn sync(&self) {
        self.enqueue(TouchEvent::Sync);
    }
}

fn uinput_factory(name: String) -> BackendFactory {
    Box::new(move || create_uinput_touchpad(&name))
}

fn abs_axis(axis: AbsoluteAxisType, max: i32) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, 0, max, 0, 0, 0))
}

fn create_uinput_touchpad(name: &str) -> Result<Box<dyn InputBackend>> {
    let mut keys = AttributeSet::<Key>::new();
    for key in [
        Key::BTN_TOUCH,
        Key::BTN_TOOL_FINGER,
        Key::BTN_TOOL_DOUBLETAP,
        Key::BTN_TOOL_TRIPLETAP,
        Key::BTN_TOOL_QUADTAP,
        Key::BTN_LEFT,
        Key::BTN_RIGHT,
        Key::BTN_MIDDLE,
    ] {
        keys.insert(key);
    }

    let mut relative = AttributeSet::<RelativeAxisType>::new();
    for axis in [
        RelativeAxisType::REL_X,
        RelativeAxisType::REL_Y,
        RelativeAxisType::REL_WHEEL,
        RelativeAxisType::REL_HWHEEL,
        RelativeAxisType::REL_WHEEL_HI_RES,
        RelativeAxisType::REL_HWHEEL_HI_RES,
    ] {
        relative.insert(axis);
    }

    let mut properties = AttributeSet::<PropType>::new();
    properties.insert(PropType::POINTER);
    properties.insert(PropType::BUTTONPAD);

    let build = || -> io::Result<evdev::uinput::VirtualDevice> {
        VirtualDeviceBuilder::new()?
            .name(name)
            .input_id(InputId::new(BusType::BUS_USB, 0x1234, 0x5678, 1))
            .with_properties(&properties)?
            .with_keys(&keys)?
            .with_absolute_axis(&abs_axis(
                AbsoluteAxisType::ABS_MT_SLOT,
                MAX_SLOTS as i32 - 1,
            ))?
            .with_absolute_axis(&abs_axis(
                AbsoluteAxisType::ABS_MT_TRACKING_ID,
                MAX_TRACKING_ID as i32,
            ))?
            .with_absolute_axis(&abs_axis(AbsoluteAxisType::ABS_MT_POSITION_X, DEVICE_MAX_X))?
            .with_absolute_axis(&abs_axis(AbsoluteAxisType::ABS_MT_POSITION_Y, DEVICE_MAX_Y))?
            .with_relative_axes(&relative)?
            .build()
    };

    let device = build().map_err(|e| DeviceError::from_creation(name, e))?;
    Ok(Box::new(UinputBackend::new(device)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::backend::{RecordedEvent, RecordingBackend};

    fn test_options() -> WorkerOptions {
        WorkerOptions {
            settle_delay: Duration::ZERO,
            ..WorkerOptions::named("test-touchpad")
        }
    }

    fn abs(axis: AbsoluteAxisType, value: i32) -> RecordedEvent {
        RecordedEvent::new(EventType::ABSOLUTE.0, axis.0, value)
    }

    fn key(key: Key, value: i32) -> RecordedEvent {
        RecordedEvent::new(EventType::KEY.0, key.code(), value)
    }

    fn rel(axis: RelativeAxisType, value: i32) -> RecordedEvent {
        RecordedEvent::new(EventType::RELATIVE.0, axis.0, value)
    }

    fn run(recorder: &RecordingBackend, actions: impl FnOnce(&VirtualTouchpad)) {
        let touchpad = VirtualTouchpad::with_backend(recorder.factory(), test_options());
        actions(&touchpad);
        assert!(touchpad.wait_idle(Duration::from_secs(2)));
    }

    #[test]
    fn test_touch_down_on_current_slot_skips_slot_select() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| {
            pad.touch_down(0, 1, 100, 200);
            pad.sync();
        });

        assert_eq!(
            recorder.reports(),
            vec![vec![
                abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, 1),
                abs(AbsoluteAxisType::ABS_MT_POSITION_X, 100),
                abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 200),
            ]]
        );
    }

    #[test]
    fn test_slot_select_only_on_change() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| {
            pad.touch_down(1, 5, 10, 10);
            pad.touch_move(1, 20, 20);
            pad.touch_up(1);
            pad.sync();
        });

        let report = &recorder.reports()[0];
        let selects = report
            .iter()
            .filter(|e| e.code == AbsoluteAxisType::ABS_MT_SLOT.0)
            .count();
        assert_eq!(selects, 1);
        assert_eq!(report[0], abs(AbsoluteAxisType::ABS_MT_SLOT, 1));
        assert_eq!(
            report.last(),
            Some(&abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1))
        );
    }

    #[test]
    fn test_two_contacts_alternate_slots() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| {
            pad.touch_down(0, 1, 10, 10);
            pad.touch_down(1, 2, 50, 50);
            pad.sync();
            pad.touch_move(0, 12, 12);
            pad.sync();
        });

        let reports = recorder.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0][3], abs(AbsoluteAxisType::ABS_MT_SLOT, 1));
        assert_eq!(reports[1][0], abs(AbsoluteAxisType::ABS_MT_SLOT, 0));
    }

    #[test]
    fn test_coordinates_clamped_to_device_space() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| {
            pad.touch_down(0, 1, -20, 900);
            pad.sync();
        });

        let report = &recorder.reports()[0];
        assert!(report.contains(&abs(AbsoluteAxisType::ABS_MT_POSITION_X, 0)));
        assert!(report.contains(&abs(AbsoluteAxisType::ABS_MT_POSITION_Y, DEVICE_MAX_Y)));
    }

    #[test]
    fn test_finger_count_flags() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| {
            pad.set_finger_count(2);
            pad.sync();
            pad.set_finger_count(5);
            pad.sync();
            pad.set_finger_count(0);
            pad.sync();
        });

        let reports = recorder.reports();
        assert_eq!(
            reports[0],
            vec![
                key(Key::BTN_TOUCH, 1),
                key(Key::BTN_TOOL_FINGER, 0),
                key(Key::BTN_TOOL_DOUBLETAP, 1),
                key(Key::BTN_TOOL_TRIPLETAP, 0),
                key(Key::BTN_TOOL_QUADTAP, 0),
            ]
        );
        assert!(reports[1].contains(&key(Key::BTN_TOOL_QUADTAP, 1)));
        assert!(reports[2].iter().all(|e| e.value == 0));
    }

    #[test]
    fn test_tap_is_two_reports() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| pad.tap(MouseButton::Right));

        assert_eq!(
            recorder.reports(),
            vec![vec![key(Key::BTN_RIGHT, 1)], vec![key(Key::BTN_RIGHT, 0)]]
        );
    }

    #[test]
    fn test_pointer_and_scroll_axes() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| {
            pad.pointer_motion(3, 0);
            pad.pointer_motion(0, 0);
            pad.scroll(0, -2);
            pad.sync();
        });

        assert_eq!(
            recorder.reports(),
            vec![vec![
                rel(RelativeAxisType::REL_X, 3),
                rel(RelativeAxisType::REL_WHEEL, -2),
                rel(RelativeAxisType::REL_WHEEL_HI_RES, -240),
            ]]
        );
    }

    #[test]
    fn test_shutdown_lifts_contacts_and_clears_fingers() {
        let recorder = RecordingBackend::new();
        let mut pad = VirtualTouchpad::with_backend(recorder.factory(), test_options());
        pad.touch_down(2, 9, 10, 10);
        pad.set_finger_count(1);
        pad.click(MouseButton::Left, true);
        pad.sync();
        pad.stop();

        let reports = recorder.reports();
        let last = reports.last().unwrap();
        assert!(last.contains(&abs(AbsoluteAxisType::ABS_MT_TRACKING_ID, -1)));
        assert!(last.contains(&key(Key::BTN_LEFT, 0)));
        assert!(last.contains(&key(Key::BTN_TOUCH, 0)));
        assert!(last.contains(&key(Key::BTN_TOOL_FINGER, 0)));
        assert_eq!(pad.state(), DeviceState::Stopped);
    }

    #[test]
    fn test_unsynced_events_are_not_written() {
        let recorder = RecordingBackend::new();
        run(&recorder, |pad| pad.touch_down(0, 1, 1, 1));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_dropped_report_does_not_move_slot_pointer() {
        let recorder = RecordingBackend::new();
        recorder.fail_next_writes(1);
        run(&recorder, |pad| {
            pad.touch_down(1, 7, 10, 10);
            pad.sync();
            pad.touch_move(1, 20, 20);
            pad.sync();
        });

        assert_eq!(
            recorder.reports(),
            vec![vec![
                abs(AbsoluteAxisType::ABS_MT_SLOT, 1),
                abs(AbsoluteAxisType::ABS_MT_POSITION_X, 20),
                abs(AbsoluteAxisType::ABS_MT_POSITION_Y, 20),
            ]]
        );
    }

    #[test]
    fn test_dropped_button_press_is_not_released_on_shutdown() {
        let recorder = RecordingBackend::new();
        recorder.fail_next_writes(1);
        let mut pad = VirtualTouchpad::with_backend(recorder.factory(), test_options());
        pad.click(MouseButton::Right, true);
        pad.sync();
        pad.stop();

        assert_eq!(pad.stats().write_errors, 1);
        let reports = recorder.reports();
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].contains(&key(Key::BTN_RIGHT, 0)));
        assert!(reports[0].contains(&key(Key::BTN_TOUCH, 0)));
    }

    #[test]
    fn test_disabled_touchpad_accepts_calls() {
        let factory: BackendFactory = Box::new(|| {
            Err(DeviceError::CreationFailed {
                name: "pad".to_string(),
                reason: "ioctl failed".to_string(),
            })
        });
        let mut pad = VirtualTouchpad::with_backend(factory, test_options());
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while pad.state() != DeviceState::Disabled && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }

        pad.touch_down(0, 1, 1, 1);
        pad.touch_move(0, 2, 2);
        pad.touch_up(0);
        pad.set_finger_count(0);
        pad.tap(MouseButton::Left);
        pad.scroll(1, 1);
        pad.sync();
        pad.stop();

        assert_eq!(pad.state(), DeviceState::Disabled);
        assert_eq!(pad.stats().submitted, 0);
    }

    #[test]
    fn test_button_from_str() {
        assert_eq!("left".parse::<MouseButton>(), Ok(MouseButton::Left));
        assert_eq!("Middle".parse::<MouseButton>(), Ok(MouseButton::Middle));
        assert_eq!("right".parse::<MouseButton>(), Ok(MouseButton::Right));
        assert!("fourth".parse::<MouseButton>().is_err());
        assert_eq!(MouseButton::Middle.to_string(), "middle");
    }
}
