//! Key Button Handling
//!
//! Turns press/release of on-screen key buttons into virtual keyboard
//! events:
//!
//! - regular keys send their code
//! - split keys send the top or bottom code depending on where they were
//!   pressed, and release the same code
//! - modifier keys go through [`ModifierState`]; only the difference between
//!   the logically active modifiers and those held on the device is sent
//! - `SPECIAL_*` keys never reach the device and come back as [`AppAction`]s

use evdev::Key;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::{self, Debug};
use std::hash::Hash;
use tracing::{debug, trace, warn};

use crate::device::{key_from_name, KeySink};
use crate::input::modifiers::ModifierState;
use crate::layout::KeyDef;

/// Prefix of key names handled by the application itself
pub const SPECIAL_PREFIX: &str = "SPECIAL_";

/// Application-level actions bound to special keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppAction {
    /// Quit the application
    Close,
    /// Return to the slim layout
    ModeToggle,
    /// Switch to the keyboard layout
    ModeKeyboard,
    /// Switch to full-size window
    ModeFull,
    /// Switch to small window
    ModeSmall,
}

impl AppAction {
    /// Every action
    pub const ALL: [AppAction; 5] = [
        AppAction::Close,
        AppAction::ModeToggle,
        AppAction::ModeKeyboard,
        AppAction::ModeFull,
        AppAction::ModeSmall,
    ];

    /// Action bound to a `SPECIAL_*` key name
    pub fn from_key_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.key_name() == name)
    }

    /// Key name used in layout files
    pub fn key_name(&self) -> &'static str {
        match self {
            AppAction::Close => "SPECIAL_CLOSE",
            AppAction::ModeToggle => "SPECIAL_MODE_TOGGLE",
            AppAction::ModeKeyboard => "SPECIAL_MODE_KEYBOARD",
            AppAction::ModeFull => "SPECIAL_MODE_FULL",
            AppAction::ModeSmall => "SPECIAL_MODE_SMALL",
        }
    }
}

impl fmt::Display for AppAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

/// Key button press/release translator
///
/// `O` identifies the touch pressing a button; it owns modifiers and split
/// key halves until it lets go.
pub struct KeyPressHandler<K, O> {
    keyboard: K,
    modifiers: ModifierState<O>,
    modifier_codes: HashMap<String, Key>,
    held_modifiers: BTreeMap<String, Key>,
    held_keys: HashMap<Key, HashSet<O>>,
    split_halves: HashMap<O, Key>,
}

impl<K, O> KeyPressHandler<K, O>
where
    K: KeySink,
    O: Eq + Hash + Clone + Debug,
{
    /// Handler sending to `keyboard`
    pub fn new(keyboard: K) -> Self {
        Self {
            keyboard,
            modifiers: ModifierState::new(),
            modifier_codes: HashMap::new(),
            held_modifiers: BTreeMap::new(),
            held_keys: HashMap::new(),
            split_halves: HashMap::new(),
        }
    }

    /// The driven keyboard
    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    /// Logical modifier state
    pub fn modifiers(&self) -> &ModifierState<O> {
        &self.modifiers
    }

    /// A key button went down
    ///
    /// `y` is the press position inside the button and `height` the button
    /// height; they only matter for split keys.
    pub fn press(&mut self, key: &KeyDef, owner: O, y: f64, height: f64) -> Option<AppAction> {
        if key.is_special() {
            let action = AppAction::from_key_name(&key.key);
            if action.is_none() {
                warn!("Unknown special key {}", key.key);
            }
            return action;
        }

        if key.is_split() {
            let half = if y < height / 2.0 {
                key.top.as_deref()
            } else {
                key.bottom.as_deref()
            };
            let Some(code) = half.and_then(key_from_name) else {
                warn!("Split key '{}' has an unknown half", key.label);
                return None;
            };
            self.keyboard.send_key(code, true);
            self.split_halves.insert(owner, code);
            return None;
        }

        let Some(code) = key_from_name(&key.key) else {
            warn!("Unknown key name {}", key.key);
            return None;
        };

        if key.is_modifier {
            if let Some(modifier) = key.modifier.as_deref() {
                self.modifier_codes.insert(modifier.to_string(), code);
                self.modifiers.press(modifier, owner);
                self.sync_modifiers();
                return None;
            }
        }

        let holders = self.held_keys.entry(code).or_default();
        if holders.is_empty() {
            self.keyboard.send_key(code, true);
        }
        holders.insert(owner);
        None
    }

    /// A key button was released or its touch cancelled
    pub fn release(&mut self, key: &KeyDef, owner: &O) {
        if key.is_special() {
            return;
        }

        if key.is_split() {
            match self.split_halves.remove(owner) {
                Some(code) => self.keyboard.send_key(code, false),
                None => trace!("No split half held by {:?}", owner),
            }
            return;
        }

        let Some(code) = key_from_name(&key.key) else {
            return;
        };

        if key.is_modifier {
            if let Some(modifier) = key.modifier.as_deref() {
                self.modifiers.release(modifier, owner);
                self.sync_modifiers();
                return;
            }
        }

        let Some(holders) = self.held_keys.get_mut(&code) else {
            trace!("Key {} not held, ignoring release by {:?}", key.key, owner);
            return;
        };
        if !holders.remove(owner) {
            trace!("Key {} not held by {:?}", key.key, owner);
            return;
        }
        // Up only once the last touch holding it lets go
        if holders.is_empty() {
            self.held_keys.remove(&code);
            self.keyboard.send_key(code, false);
        }
    }

    /// Release every key and modifier held on the device
    pub fn release_all(&mut self) {
        let mut held: Vec<Key> = self.held_keys.drain().map(|(code, _)| code).collect();
        held.extend(self.split_halves.drain().map(|(_, code)| code));
        held.sort_by_key(|k| k.code());
        held.dedup();
        for code in held {
            self.keyboard.send_key(code, false);
        }

        self.modifiers.clear();
        self.sync_modifiers();
        debug!("Released all keys");
    }

    fn sync_modifiers(&mut self) {
        let active = self.modifiers.active_modifiers();

        let released: Vec<String> = self
            .held_modifiers
            .keys()
            .filter(|name| !active.contains(*name))
            .cloned()
            .collect();
        for name in released {
            if let Some(code) = self.held_modifiers.remove(&name) {
                trace!("Modifier {} up", name);
                self.keyboard.send_key(code, false);
            }
        }

        for name in active {
            if self.held_modifiers.contains_key(&name) {
                continue;
            }
            if let Some(&code) = self.modifier_codes.get(&name) {
                trace!("Modifier {} down", name);
                self.keyboard.send_key(code, true);
                self.held_modifiers.insert(name, code);
            }
        }
    }
}
