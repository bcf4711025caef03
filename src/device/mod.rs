//! Virtual Input Devices
//!
//! Kernel-level input devices created through `/dev/uinput`. Every device owns
//! one worker thread and one bounded FIFO; callers only enqueue.
//!
//! # Architecture
//!
//! ```text
//! VirtualKeyboard / VirtualTouchpad      (enqueue-only facades)
//!       ↓ try_send
//! ┌──────────────────────────┐
//! │  DeviceWorker<E>         │ ← one thread per device
//! │  - bounded crossbeam FIFO│
//! │  - lifecycle state       │
//! └──────────────────────────┘
//!       ↓ DeviceProtocol::apply
//! ┌──────────────────────────┐
//! │  InputBackend            │ ← uinput node, or recorder for tests/dry runs
//! └──────────────────────────┘
//!       ↓
//! /dev/uinput
//! ```
//!
//! A device whose registration fails (usually a permission problem on
//! `/dev/uinput`) becomes [`DeviceState::Disabled`]: all operations stay
//! callable and silently drop their events.
//!
//! # Example
//!
//! ```rust,no_run
//! use yogaboard_input::device::{VirtualKeyboard, WorkerOptions, KEYBOARD_DEVICE_NAME};
//! use evdev::Key;
//!
//! let mut keyboard = VirtualKeyboard::start(KEYBOARD_DEVICE_NAME, WorkerOptions::named("keyboard"));
//! keyboard.press_and_release(Key::KEY_A);
//! keyboard.stop();
//! ```

pub mod backend;
pub mod error;
pub mod keyboard;
pub mod keycodes;
pub mod touchpad;
pub mod worker;

pub use backend::{BackendFactory, InputBackend, RecordedEvent, RecordingBackend, UinputBackend};
pub use error::{DeviceError, Result};
pub use keyboard::{KeyAction, KeyEvent, KeySink, VirtualKeyboard, KEYBOARD_DEVICE_NAME};
pub use keycodes::{ascii_to_key, key_from_name, key_name, modifier_key, supported_keys, KEY_TABLE};
pub use touchpad::{
    MouseButton, TouchEvent, TouchpadSink, VirtualTouchpad, DEVICE_MAX_X, DEVICE_MAX_Y,
    MAX_SLOTS, MAX_TRACKING_ID, TOUCHPAD_DEVICE_NAME,
};
pub use worker::{DeviceProtocol, DeviceState, DeviceStats, DeviceWorker, WorkerOptions};
