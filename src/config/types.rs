//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::device::{WorkerOptions, KEYBOARD_DEVICE_NAME, TOUCHPAD_DEVICE_NAME};
use crate::input::{GestureSettings, TouchpadMode};

/// Longest accepted tap-drag window, in seconds
pub const MAX_TAP_DRAG_WINDOW: f64 = 10.0;

/// Touchpad gesture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchpadConfig {
    /// Pointer speed multiplier for single-finger motion
    pub pointer_sensitivity: f64,

    /// Scroll speed multiplier for two-finger motion
    pub scroll_sensitivity: f64,

    /// Recognise tap, release, touch-and-hold as a drag
    pub tap_drag_enabled: bool,

    /// Seconds after a tap in which a new touch starts a drag
    pub tap_drag_window: f64,

    /// "gestures" or "passthrough"
    pub mode: TouchpadMode,
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        Self {
            pointer_sensitivity: 2.0,
            scroll_sensitivity: 0.15,
            tap_drag_enabled: true,
            tap_drag_window: 0.25,
            mode: TouchpadMode::Gestures,
        }
    }
}

impl TouchpadConfig {
    /// Engine settings for this configuration
    pub fn gesture_settings(&self) -> GestureSettings {
        GestureSettings {
            pointer_sensitivity: self.pointer_sensitivity,
            scroll_sensitivity: self.scroll_sensitivity,
            tap_drag_enabled: self.tap_drag_enabled,
            tap_drag_window: Duration::try_from_secs_f64(
                self.tap_drag_window.clamp(0.0, MAX_TAP_DRAG_WINDOW),
            )
            .unwrap_or_else(|_| GestureSettings::default().tap_drag_window),
            mode: self.mode,
        }
    }
}

/// Virtual device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    /// Product name of the virtual keyboard
    pub keyboard_name: String,

    /// Product name of the virtual touchpad
    pub touchpad_name: String,

    /// Idle worker wake-up interval in milliseconds
    pub poll_interval_ms: u64,

    /// Upper bound on waiting for a worker at shutdown, in milliseconds
    pub shutdown_timeout_ms: u64,

    /// Pause after device creation, in milliseconds
    pub settle_delay_ms: u64,

    /// Events each device queue holds before dropping
    pub queue_capacity: usize,
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            keyboard_name: KEYBOARD_DEVICE_NAME.to_string(),
            touchpad_name: TOUCHPAD_DEVICE_NAME.to_string(),
            poll_interval_ms: 1,
            shutdown_timeout_ms: 1000,
            settle_delay_ms: 100,
            queue_capacity: 4096,
        }
    }
}

impl DevicesConfig {
    /// Worker options for a device thread
    pub fn worker_options(&self, thread_name: &str) -> WorkerOptions {
        WorkerOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            queue_capacity: self.queue_capacity,
            ..WorkerOptions::named(thread_name)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    pub level: String,

    /// Also write logs to this file
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}
