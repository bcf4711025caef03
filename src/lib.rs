//! # yogaboard-input
//!
//! Virtual keyboard and multi-touch touchpad for Linux, injected through
//! `/dev/uinput`, plus the touch interpretation that drives them from an
//! on-screen keyboard.
//!
//! # Architecture
//!
//! ```text
//! yogaboard-input
//!   ├─> device   (uinput devices, one worker thread + FIFO each)
//!   ├─> input    (gesture engine, slot allocation, modifiers, key buttons)
//!   ├─> layout   (JSON keyboard layouts)
//!   ├─> config   (TOML configuration)
//!   └─> utils    (diagnostics, user-facing error formatting)
//! ```
//!
//! # Data Flow
//!
//! **Touchpad Path:** UI contacts → GestureEngine → VirtualTouchpad queue → worker → kernel
//!
//! **Keyboard Path:** UI key buttons → KeyPressHandler → VirtualKeyboard queue → worker → kernel

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration file handling
pub mod config;

/// Virtual uinput devices
pub mod device;

/// Touch and key button interpretation
pub mod input;

/// Keyboard layout files
pub mod layout;

/// Utility functions
pub mod utils;

pub use config::Config;
pub use device::{DeviceError, DeviceState, VirtualKeyboard, VirtualTouchpad};
pub use input::{GestureEngine, GestureSettings, KeyPressHandler, ModifierState};
pub use layout::{Layout, LayoutError};
