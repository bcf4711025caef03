//! Touch Input Interpretation
//!
//! Everything between the UI's raw touch/button callbacks and the virtual
//! devices.
//!
//! # Architecture
//!
//! ```text
//! touch surface contacts           key button presses
//!       ↓                                  ↓
//! ┌───────────────────────┐   ┌───────────────────────┐
//! │  GestureEngine        │   │  KeyPressHandler      │
//! │  - sessions, taps     │   │  - split keys         │
//! │  - SlotAllocator      │   │  - ModifierState      │
//! │  - SubPixelAccumulator│   │  - special actions    │
//! └───────────────────────┘   └───────────────────────┘
//!       ↓ TouchpadSink                     ↓ KeySink
//! VirtualTouchpad                   VirtualKeyboard
//! ```
//!
//! All types here are single-threaded and owned by the UI thread. They only
//! enqueue work on the devices.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Instant;
//! use yogaboard_input::device::{VirtualTouchpad, WorkerOptions, TOUCHPAD_DEVICE_NAME};
//! use yogaboard_input::input::{GestureEngine, GestureSettings};
//!
//! let touchpad = VirtualTouchpad::start(TOUCHPAD_DEVICE_NAME, WorkerOptions::named("touchpad"));
//! let mut engine: GestureEngine<_, u64> = GestureEngine::new(touchpad, GestureSettings::default());
//!
//! let now = Instant::now();
//! engine.begin(1, 120.0, 80.0, now);
//! engine.update(&1, 160.0, 80.0);
//! engine.end(&1, Instant::now());
//! ```

pub mod accumulator;
pub mod coordinates;
pub mod gesture;
pub mod key_press;
pub mod modifiers;
pub mod slots;

pub use accumulator::SubPixelAccumulator;
pub use coordinates::{CoordinateMapper, SurfaceSize};
pub use gesture::{
    GestureEngine, GestureOutcome, GestureSettings, TouchpadMode, TAP_MAX_DURATION,
    TAP_MAX_MOVEMENT,
};
pub use key_press::{AppAction, KeyPressHandler, SPECIAL_PREFIX};
pub use modifiers::ModifierState;
pub use slots::{SlotAllocator, SlotAssignment};
