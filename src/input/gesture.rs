//! Gesture Recognition
//!
//! Turns a stream of simultaneous touch contacts into touchpad actions.
//!
//! # Sessions
//!
//! A session starts when the first contact goes down and ends when the last
//! one lifts:
//!
//! ```text
//!            begin (0→1)                       end/cancel (→0)
//!   idle ─────────────────> active ─────────────────────────────> idle
//!                             │ update
//!                             ├─ 1 contact   → pointer motion
//!                             └─ 2+ contacts → scroll (centroid delta)
//! ```
//!
//! At session end a short, still session becomes a tap: one finger taps
//! left, two tap right, three or more tap middle. A new session that starts
//! shortly after a single-finger tap presses the left button and holds it
//! until the session ends (tap-and-drag).
//!
//! In [`TouchpadMode::Passthrough`] no gestures are recognised; each contact
//! is forwarded as a raw multi-touch contact instead.
//!
//! All timing comes in through the `now` argument of each call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::device::{MouseButton, TouchpadSink};
use crate::input::accumulator::SubPixelAccumulator;
use crate::input::coordinates::CoordinateMapper;
use crate::input::slots::{SlotAllocator, SlotAssignment};

/// Longest session that still counts as a tap
pub const TAP_MAX_DURATION: Duration = Duration::from_millis(250);

/// Largest displacement from the start point that still counts as a tap
pub const TAP_MAX_MOVEMENT: f64 = 15.0;

/// How contacts are turned into device events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchpadMode {
    /// Recognise gestures and emit pointer, scroll and button events
    #[default]
    Gestures,
    /// Forward raw multi-touch contacts and let libinput interpret them
    Passthrough,
}

impl FromStr for TouchpadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gestures" => Ok(TouchpadMode::Gestures),
            "passthrough" => Ok(TouchpadMode::Passthrough),
            other => Err(format!("unknown touchpad mode '{}'", other)),
        }
    }
}

impl fmt::Display for TouchpadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchpadMode::Gestures => f.write_str("gestures"),
            TouchpadMode::Passthrough => f.write_str("passthrough"),
        }
    }
}

/// Engine tuning
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSettings {
    /// Pointer units per surface unit of single-finger motion
    pub pointer_sensitivity: f64,
    /// Wheel detents per surface unit of two-finger motion
    pub scroll_sensitivity: f64,
    /// Whether tap-and-drag is recognised
    pub tap_drag_enabled: bool,
    /// Window after a tap in which a new touch starts a drag
    pub tap_drag_window: Duration,
    /// Gesture recognition or raw passthrough
    pub mode: TouchpadMode,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            pointer_sensitivity: 2.0,
            scroll_sensitivity: 0.15,
            tap_drag_enabled: true,
            tap_drag_window: Duration::from_millis(250),
            mode: TouchpadMode::Gestures,
        }
    }
}

/// What a finished session was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// A tap of this button was emitted
    Tap(MouseButton),
    /// A tap-and-drag ended and the left button was released
    DragReleased,
    /// The session was cancelled; nothing was classified
    Cancelled,
}

#[derive(Debug, Clone)]
struct Contact {
    assignment: SlotAssignment,
    start: (f64, f64),
    last: (f64, f64),
    moved: bool,
}

impl Contact {
    fn displacement(&self) -> f64 {
        (self.last.0 - self.start.0).hypot(self.last.1 - self.start.1)
    }
}

#[derive(Debug)]
struct Session {
    started_at: Instant,
    peak_contacts: usize,
    moved: bool,
    cancelled: bool,
    tap_drag: bool,
    pointer: SubPixelAccumulator,
    scroll: SubPixelAccumulator,
}

impl Session {
    fn new(started_at: Instant, tap_drag: bool) -> Self {
        Self {
            started_at,
            peak_contacts: 0,
            moved: false,
            cancelled: false,
            tap_drag,
            pointer: SubPixelAccumulator::new(),
            scroll: SubPixelAccumulator::new(),
        }
    }
}

/// Contact-stream to touchpad translator
///
/// `C` is the caller's opaque contact identifier; only equality and hashing
/// are used.
pub struct GestureEngine<S, C> {
    sink: S,
    settings: GestureSettings,
    contacts: HashMap<C, Contact>,
    slots: SlotAllocator,
    mapper: CoordinateMapper,
    session: Option<Session>,
    last_tap: Option<Instant>,
}

impl<S, C> GestureEngine<S, C>
where
    S: TouchpadSink,
    C: Eq + Hash + Clone + Debug,
{
    /// Engine driving `sink`
    pub fn new(sink: S, settings: GestureSettings) -> Self {
        debug!("Gesture engine in {} mode", settings.mode);
        Self {
            sink,
            settings,
            contacts: HashMap::new(),
            slots: SlotAllocator::new(),
            mapper: CoordinateMapper::default(),
            session: None,
            last_tap: None,
        }
    }

    /// The driven touchpad
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Take the touchpad back
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Current settings
    pub fn settings(&self) -> &GestureSettings {
        &self.settings
    }

    /// Replace the settings
    ///
    /// Switching mode lifts every tracked contact first.
    pub fn set_settings(&mut self, settings: GestureSettings) {
        if settings.mode != self.settings.mode {
            self.reset();
        }
        self.settings = settings;
    }

    /// Size of the touch surface, used for passthrough coordinates
    pub fn set_surface_size(&mut self, width: f64, height: f64) {
        self.mapper.set_surface_size(width, height);
    }

    /// Number of tracked contacts
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Slot and tracking ID of a tracked contact
    pub fn assignment(&self, id: &C) -> Option<SlotAssignment> {
        self.contacts.get(id).map(|c| c.assignment)
    }

    /// Whether the left button is held by tap-and-drag
    pub fn in_tap_drag(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.tap_drag)
    }

    /// A contact touched down
    pub fn begin(&mut self, id: C, x: f64, y: f64, now: Instant) {
        if let Some(contact) = self.contacts.get_mut(&id) {
            trace!("Contact {:?} began again, resetting position", id);
            contact.start = (x, y);
            contact.last = (x, y);
            contact.moved = false;
            if self.settings.mode == TouchpadMode::Passthrough {
                let slot = contact.assignment.slot;
                let (dx, dy) = self.mapper.to_device(x, y);
                self.sink.touch_move(slot, dx, dy);
                self.sink.sync();
            }
            return;
        }

        if self.contacts.is_empty() && self.settings.mode == TouchpadMode::Gestures {
            self.start_session(now);
        }

        let assignment = self.slots.allocate();
        self.contacts.insert(
            id,
            Contact {
                assignment,
                start: (x, y),
                last: (x, y),
                moved: false,
            },
        );
        let count = self.contacts.len();

        match self.settings.mode {
            TouchpadMode::Gestures => {
                if let Some(session) = self.session.as_mut() {
                    session.peak_contacts = session.peak_contacts.max(count);
                }
            }
            TouchpadMode::Passthrough => {
                let (dx, dy) = self.mapper.to_device(x, y);
                self.sink
                    .touch_down(assignment.slot, assignment.tracking_id, dx, dy);
                self.sink.set_finger_count(count);
                self.sink.sync();
            }
        }
    }

    /// A contact moved
    pub fn update(&mut self, id: &C, x: f64, y: f64) {
        let Some(contact) = self.contacts.get_mut(id) else {
            trace!("Update for unknown contact {:?}", id);
            return;
        };

        let delta = (x - contact.last.0, y - contact.last.1);
        contact.last = (x, y);

        if self.settings.mode == TouchpadMode::Passthrough {
            let (dx, dy) = self.mapper.to_device(x, y);
            self.sink.touch_move(contact.assignment.slot, dx, dy);
            self.sink.sync();
            return;
        }

        if contact.displacement() > TAP_MAX_MOVEMENT {
            contact.moved = true;
        }
        let contact_moved = contact.moved;
        let live = self.contacts.len();

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.moved |= contact_moved;
        if session.cancelled {
            return;
        }

        // Motion is held back until the session leaves the tap threshold
        let release = session.moved || session.tap_drag;

        if live == 1 {
            let sensitivity = self.settings.pointer_sensitivity;
            session
                .pointer
                .add(delta.0 * sensitivity, delta.1 * sensitivity);
            if !release {
                return;
            }
            let (dx, dy) = session.pointer.take();
            if dx != 0 || dy != 0 {
                self.sink.pointer_motion(dx, dy);
                self.sink.sync();
            }
        } else {
            // Each finger contributes its share of the centroid motion
            let scale = self.settings.scroll_sensitivity / live as f64;
            session.scroll.add(delta.0 * scale, -delta.1 * scale);
            if !release {
                return;
            }
            let (horizontal, vertical) = session.scroll.take();
            if horizontal != 0 || vertical != 0 {
                self.sink.scroll(horizontal, vertical);
                self.sink.sync();
            }
        }
    }

    /// A contact lifted
    ///
    /// Returns the classification when this was the last contact.
    pub fn end(&mut self, id: &C, now: Instant) -> Option<GestureOutcome> {
        self.remove_contact(id, now)
    }

    /// A contact was cancelled by the toolkit
    ///
    /// The whole session is abandoned once its last contact is gone.
    pub fn cancel(&mut self, id: &C, now: Instant) -> Option<GestureOutcome> {
        if !self.contacts.contains_key(id) {
            trace!("Cancel for unknown contact {:?}", id);
            return None;
        }
        if let Some(session) = self.session.as_mut() {
            session.cancelled = true;
        }
        self.remove_contact(id, now)
    }

    /// Lift every contact and forget all state
    pub fn reset(&mut self) {
        match self.settings.mode {
            TouchpadMode::Passthrough => {
                if !self.contacts.is_empty() {
                    for contact in self.contacts.values() {
                        self.sink.touch_up(contact.assignment.slot);
                    }
                    self.sink.set_finger_count(0);
                    self.sink.sync();
                }
            }
            TouchpadMode::Gestures => {
                if let Some(mut session) = self.session.take() {
                    session.cancelled = true;
                    self.finish_session(session, None);
                }
            }
        }

        self.contacts.clear();
        self.slots.reset();
        self.session = None;
        self.last_tap = None;
    }

    fn start_session(&mut self, now: Instant) {
        let tap_drag = self.settings.tap_drag_enabled
            && self
                .last_tap
                .take()
                .is_some_and(|tap| now.saturating_duration_since(tap) <= self.settings.tap_drag_window);

        if tap_drag {
            debug!("Tap-and-drag started");
            self.sink.click(MouseButton::Left, true);
            self.sink.sync();
        }

        self.session = Some(Session::new(now, tap_drag));
    }

    fn remove_contact(&mut self, id: &C, now: Instant) -> Option<GestureOutcome> {
        let Some(contact) = self.contacts.remove(id) else {
            trace!("End for unknown contact {:?}", id);
            return None;
        };
        self.slots.release(contact.assignment);

        if self.settings.mode == TouchpadMode::Passthrough {
            self.sink.touch_up(contact.assignment.slot);
            self.sink.set_finger_count(self.contacts.len());
            self.sink.sync();
            return None;
        }

        if !self.contacts.is_empty() {
            return None;
        }

        let session = self.session.take()?;
        self.finish_session(session, Some(now))
    }

    fn finish_session(&mut self, session: Session, now: Option<Instant>) -> Option<GestureOutcome> {
        if session.tap_drag {
            debug!("Tap-and-drag released");
            self.sink.click(MouseButton::Left, false);
            self.sink.sync();
            if !session.cancelled {
                return Some(GestureOutcome::DragReleased);
            }
        }

        if session.cancelled {
            debug!("Session cancelled");
            return Some(GestureOutcome::Cancelled);
        }

        let now = now?;
        let duration = now.saturating_duration_since(session.started_at);
        if duration > TAP_MAX_DURATION || session.moved {
            trace!(
                "Session ended without tap ({:?}, moved: {})",
                duration,
                session.moved
            );
            return None;
        }

        let button = match session.peak_contacts {
            0 => return None,
            1 => MouseButton::Left,
            2 => MouseButton::Right,
            _ => MouseButton::Middle,
        };

        debug!("{}-finger tap -> {}", session.peak_contacts, button);
        self.sink.tap(button);
        if session.peak_contacts == 1 {
            self.last_tap = Some(now);
        }
        Some(GestureOutcome::Tap(button))
    }
}
