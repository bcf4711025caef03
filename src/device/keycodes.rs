//! Key Code Tables
//!
//! Static mapping from symbolic key names (as used in layout files, e.g.
//! `KEY_A`) to Linux evdev key codes. The full table is also the capability
//! set registered for the virtual keyboard.

use evdev::{AttributeSet, Key};

/// Linux evdev key codes
pub mod codes {
    pub const KEY_ESC: u16 = 1;
    pub const KEY_1: u16 = 2;
    pub const KEY_2: u16 = 3;
    pub const KEY_3: u16 = 4;
    pub const KEY_4: u16 = 5;
    pub const KEY_5: u16 = 6;
    pub const KEY_6: u16 = 7;
    pub const KEY_7: u16 = 8;
    pub const KEY_8: u16 = 9;
    pub const KEY_9: u16 = 10;
    pub const KEY_0: u16 = 11;
    pub const KEY_MINUS: u16 = 12;
    pub const KEY_EQUAL: u16 = 13;
    pub const KEY_BACKSPACE: u16 = 14;
    pub const KEY_TAB: u16 = 15;
    pub const KEY_Q: u16 = 16;
    pub const KEY_W: u16 = 17;
    pub const KEY_E: u16 = 18;
    pub const KEY_R: u16 = 19;
    pub const KEY_T: u16 = 20;
    pub const KEY_Y: u16 = 21;
    pub const KEY_U: u16 = 22;
    pub const KEY_I: u16 = 23;
    pub const KEY_O: u16 = 24;
    pub const KEY_P: u16 = 25;
    pub const KEY_LEFTBRACE: u16 = 26;
    pub const KEY_RIGHTBRACE: u16 = 27;
    pub const KEY_ENTER: u16 = 28;
    pub const KEY_LEFTCTRL: u16 = 29;
    pub const KEY_A: u16 = 30;
    pub const KEY_S: u16 = 31;
    pub const KEY_D: u16 = 32;
    pub const KEY_F: u16 = 33;
    pub const KEY_G: u16 = 34;
    pub const KEY_H: u16 = 35;
    pub const KEY_J: u16 = 36;
    pub const KEY_K: u16 = 37;
    pub const KEY_L: u16 = 38;
    pub const KEY_SEMICOLON: u16 = 39;
    pub const KEY_APOSTROPHE: u16 = 40;
    pub const KEY_GRAVE: u16 = 41;
    pub const KEY_LEFTSHIFT: u16 = 42;
    pub const KEY_BACKSLASH: u16 = 43;
    pub const KEY_Z: u16 = 44;
    pub const KEY_X: u16 = 45;
    pub const KEY_C: u16 = 46;
    pub const KEY_V: u16 = 47;
    pub const KEY_B: u16 = 48;
    pub const KEY_N: u16 = 49;
    pub const KEY_M: u16 = 50;
    pub const KEY_COMMA: u16 = 51;
    pub const KEY_DOT: u16 = 52;
    pub const KEY_SLASH: u16 = 53;
    pub const KEY_RIGHTSHIFT: u16 = 54;
    pub const KEY_KPASTERISK: u16 = 55;
    pub const KEY_LEFTALT: u16 = 56;
    pub const KEY_SPACE: u16 = 57;
    pub const KEY_CAPSLOCK: u16 = 58;

    // Function keys
    pub const KEY_F1: u16 = 59;
    pub const KEY_F2: u16 = 60;
    pub const KEY_F3: u16 = 61;
    pub const KEY_F4: u16 = 62;
    pub const KEY_F5: u16 = 63;
    pub const KEY_F6: u16 = 64;
    pub const KEY_F7: u16 = 65;
    pub const KEY_F8: u16 = 66;
    pub const KEY_F9: u16 = 67;
    pub const KEY_F10: u16 = 68;
    pub const KEY_NUMLOCK: u16 = 69;
    pub const KEY_SCROLLLOCK: u16 = 70;

    // Numpad
    pub const KEY_KP7: u16 = 71;
    pub const KEY_KP8: u16 = 72;
    pub const KEY_KP9: u16 = 73;
    pub const KEY_KPMINUS: u16 = 74;
    pub const KEY_KP4: u16 = 75;
    pub const KEY_KP5: u16 = 76;
    pub const KEY_KP6: u16 = 77;
    pub const KEY_KPPLUS: u16 = 78;
    pub const KEY_KP1: u16 = 79;
    pub const KEY_KP2: u16 = 80;
    pub const KEY_KP3: u16 = 81;
    pub const KEY_KP0: u16 = 82;
    pub const KEY_KPDOT: u16 = 83;

    pub const KEY_102ND: u16 = 86;
    pub const KEY_F11: u16 = 87;
    pub const KEY_F12: u16 = 88;
    pub const KEY_KPENTER: u16 = 96;
    pub const KEY_RIGHTCTRL: u16 = 97;
    pub const KEY_KPSLASH: u16 = 98;
    pub const KEY_SYSRQ: u16 = 99;
    pub const KEY_RIGHTALT: u16 = 100;
    pub const KEY_HOME: u16 = 102;
    pub const KEY_UP: u16 = 103;
    pub const KEY_PAGEUP: u16 = 104;
    pub const KEY_LEFT: u16 = 105;
    pub const KEY_RIGHT: u16 = 106;
    pub const KEY_END: u16 = 107;
    pub const KEY_DOWN: u16 = 108;
    pub const KEY_PAGEDOWN: u16 = 109;
    pub const KEY_INSERT: u16 = 110;
    pub const KEY_DELETE: u16 = 111;
    pub const KEY_MUTE: u16 = 113;
    pub const KEY_VOLUMEDOWN: u16 = 114;
    pub const KEY_VOLUMEUP: u16 = 115;
    pub const KEY_POWER: u16 = 116;
    pub const KEY_PAUSE: u16 = 119;
    pub const KEY_LEFTMETA: u16 = 125;
    pub const KEY_RIGHTMETA: u16 = 126;
    pub const KEY_COMPOSE: u16 = 127;
    pub const KEY_STOP: u16 = 128;
    pub const KEY_CALC: u16 = 140;
    pub const KEY_SLEEP: u16 = 142;
    pub const KEY_WAKEUP: u16 = 143;
    pub const KEY_FILE: u16 = 144;
    pub const KEY_PROG1: u16 = 148;
    pub const KEY_PROG2: u16 = 149;
    pub const KEY_COFFEE: u16 = 152;
    pub const KEY_MAIL: u16 = 155;
    pub const KEY_BOOKMARKS: u16 = 156;
    pub const KEY_COMPUTER: u16 = 157;
    pub const KEY_BACK: u16 = 158;
    pub const KEY_FORWARD: u16 = 159;
    pub const KEY_NEXTSONG: u16 = 163;
    pub const KEY_PLAYPAUSE: u16 = 164;
    pub const KEY_PREVIOUSSONG: u16 = 165;
    pub const KEY_STOPCD: u16 = 166;
    pub const KEY_HOMEPAGE: u16 = 172;
    pub const KEY_REFRESH: u16 = 173;
    pub const KEY_F13: u16 = 183;
    pub const KEY_F14: u16 = 184;
    pub const KEY_F15: u16 = 185;
    pub const KEY_F16: u16 = 186;
    pub const KEY_F17: u16 = 187;
    pub const KEY_F18: u16 = 188;
    pub const KEY_F19: u16 = 189;
    pub const KEY_F20: u16 = 190;
    pub const KEY_F21: u16 = 191;
    pub const KEY_F22: u16 = 192;
    pub const KEY_F23: u16 = 193;
    pub const KEY_F24: u16 = 194;
    pub const KEY_PROG3: u16 = 202;
    pub const KEY_PROG4: u16 = 203;
    pub const KEY_SUSPEND: u16 = 205;
    pub const KEY_PRINT: u16 = 210;
    pub const KEY_CAMERA: u16 = 212;
    pub const KEY_SEARCH: u16 = 217;
    pub const KEY_BRIGHTNESSDOWN: u16 = 224;
    pub const KEY_BRIGHTNESSUP: u16 = 225;
    pub const KEY_MEDIA: u16 = 226;
    pub const KEY_SWITCHVIDEOMODE: u16 = 227;
    pub const KEY_BATTERY: u16 = 236;
    pub const KEY_BLUETOOTH: u16 = 237;
    pub const KEY_WLAN: u16 = 238;
    pub const KEY_DISPLAY_OFF: u16 = 245;
    pub const KEY_MICMUTE: u16 = 248;
    pub const KEY_ZOOM: u16 = 372;
    pub const KEY_ZOOMIN: u16 = 418;
    pub const KEY_ZOOMOUT: u16 = 419;
    pub const KEY_ZOOMRESET: u16 = 420;
    pub const KEY_TOUCHPAD_TOGGLE: u16 = 530;
    pub const KEY_TOUCHPAD_ON: u16 = 531;
    pub const KEY_TOUCHPAD_OFF: u16 = 532;
    pub const KEY_SCREENSAVER: u16 = 581;
}

use codes::*;

macro_rules! key_table {
    ($($name:ident),* $(,)?) => {
        /// Every supported key, by layout name
        pub static KEY_TABLE: &[(&str, u16)] = &[$((stringify!($name), $name)),*];
    };
}

key_table![
    // Letters
    KEY_A, KEY_B, KEY_C, KEY_D, KEY_E, KEY_F, KEY_G, KEY_H, KEY_I, KEY_J, KEY_K, KEY_L, KEY_M,
    KEY_N, KEY_O, KEY_P, KEY_Q, KEY_R, KEY_S, KEY_T, KEY_U, KEY_V, KEY_W, KEY_X, KEY_Y, KEY_Z,
    // Digits
    KEY_0, KEY_1, KEY_2, KEY_3, KEY_4, KEY_5, KEY_6, KEY_7, KEY_8, KEY_9,
    // Function keys
    KEY_F1, KEY_F2, KEY_F3, KEY_F4, KEY_F5, KEY_F6, KEY_F7, KEY_F8, KEY_F9, KEY_F10, KEY_F11,
    KEY_F12, KEY_F13, KEY_F14, KEY_F15, KEY_F16, KEY_F17, KEY_F18, KEY_F19, KEY_F20, KEY_F21,
    KEY_F22, KEY_F23, KEY_F24,
    // Modifiers
    KEY_LEFTSHIFT, KEY_RIGHTSHIFT, KEY_LEFTCTRL, KEY_RIGHTCTRL, KEY_LEFTALT, KEY_RIGHTALT,
    KEY_LEFTMETA, KEY_RIGHTMETA,
    // Editing
    KEY_SPACE, KEY_ENTER, KEY_BACKSPACE, KEY_TAB, KEY_ESC, KEY_CAPSLOCK,
    // Punctuation
    KEY_MINUS, KEY_EQUAL, KEY_LEFTBRACE, KEY_RIGHTBRACE, KEY_SEMICOLON, KEY_APOSTROPHE,
    KEY_GRAVE, KEY_BACKSLASH, KEY_COMMA, KEY_DOT, KEY_SLASH, KEY_102ND,
    // Navigation
    KEY_UP, KEY_DOWN, KEY_LEFT, KEY_RIGHT, KEY_HOME, KEY_END, KEY_PAGEUP, KEY_PAGEDOWN,
    KEY_INSERT, KEY_DELETE,
    // System
    KEY_SYSRQ, KEY_SCROLLLOCK, KEY_PAUSE, KEY_PRINT, KEY_COMPOSE,
    // Numpad
    KEY_NUMLOCK, KEY_KP0, KEY_KP1, KEY_KP2, KEY_KP3, KEY_KP4, KEY_KP5, KEY_KP6, KEY_KP7, KEY_KP8,
    KEY_KP9, KEY_KPSLASH, KEY_KPASTERISK, KEY_KPMINUS, KEY_KPPLUS, KEY_KPENTER, KEY_KPDOT,
    // Media
    KEY_MUTE, KEY_VOLUMEDOWN, KEY_VOLUMEUP, KEY_PLAYPAUSE, KEY_STOPCD, KEY_PREVIOUSSONG,
    KEY_NEXTSONG, KEY_MEDIA,
    // Display
    KEY_BRIGHTNESSDOWN, KEY_BRIGHTNESSUP, KEY_DISPLAY_OFF, KEY_SWITCHVIDEOMODE,
    // Power
    KEY_SLEEP, KEY_WAKEUP, KEY_POWER, KEY_SUSPEND,
    // Laptop function keys
    KEY_BATTERY, KEY_WLAN, KEY_BLUETOOTH, KEY_TOUCHPAD_TOGGLE, KEY_TOUCHPAD_ON,
    KEY_TOUCHPAD_OFF, KEY_CAMERA, KEY_MICMUTE,
    // Application shortcuts
    KEY_MAIL, KEY_HOMEPAGE, KEY_SEARCH, KEY_BOOKMARKS, KEY_BACK, KEY_FORWARD, KEY_STOP,
    KEY_REFRESH, KEY_CALC, KEY_FILE, KEY_COMPUTER,
    // Zoom
    KEY_ZOOM, KEY_ZOOMIN, KEY_ZOOMOUT, KEY_ZOOMRESET,
    // Misc
    KEY_SCREENSAVER, KEY_COFFEE, KEY_PROG1, KEY_PROG2, KEY_PROG3, KEY_PROG4,
];

/// Look up a key by its layout name (`"KEY_A"`)
pub fn key_from_name(name: &str) -> Option<Key> {
    KEY_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, code)| Key::new(code))
}

/// Layout name of a key code, if it is in the table
pub fn key_name(key: Key) -> Option<&'static str> {
    KEY_TABLE
        .iter()
        .find(|&&(_, code)| code == key.code())
        .map(|&(name, _)| name)
}

/// Capability set registered for the virtual keyboard
pub fn supported_keys() -> AttributeSet<Key> {
    let mut keys = AttributeSet::<Key>::new();
    for &(_, code) in KEY_TABLE {
        keys.insert(Key::new(code));
    }
    keys
}

/// Key code for a named modifier (`shift`, `ctrl`, `alt`, `altgr`, `super`)
pub fn modifier_key(modifier: &str) -> Option<Key> {
    let code = match modifier.to_ascii_lowercase().as_str() {
        "shift" => KEY_LEFTSHIFT,
        "ctrl" | "control" => KEY_LEFTCTRL,
        "alt" => KEY_LEFTALT,
        "altgr" => KEY_RIGHTALT,
        "super" | "meta" | "win" => KEY_LEFTMETA,
        _ => return None,
    };
    Some(Key::new(code))
}

/// Key and shift state producing an ASCII character on a US layout
pub fn ascii_to_key(ch: char) -> Option<(Key, bool)> {
    let (code, shift) = match ch {
        'a'..='z' => (letter_code(ch)?, false),
        'A'..='Z' => (letter_code(ch.to_ascii_lowercase())?, true),
        '1'..='9' => (KEY_1 + (ch as u16 - '1' as u16), false),
        '0' => (KEY_0, false),
        ' ' => (KEY_SPACE, false),
        '\n' => (KEY_ENTER, false),
        '\t' => (KEY_TAB, false),
        '-' => (KEY_MINUS, false),
        '_' => (KEY_MINUS, true),
        '=' => (KEY_EQUAL, false),
        '+' => (KEY_EQUAL, true),
        '[' => (KEY_LEFTBRACE, false),
        '{' => (KEY_LEFTBRACE, true),
        ']' => (KEY_RIGHTBRACE, false),
        '}' => (KEY_RIGHTBRACE, true),
        ';' => (KEY_SEMICOLON, false),
        ':' => (KEY_SEMICOLON, true),
        '\'' => (KEY_APOSTROPHE, false),
        '"' => (KEY_APOSTROPHE, true),
        '`' => (KEY_GRAVE, false),
        '~' => (KEY_GRAVE, true),
        '\\' => (KEY_BACKSLASH, false),
        '|' => (KEY_BACKSLASH, true),
        ',' => (KEY_COMMA, false),
        '<' => (KEY_COMMA, true),
        '.' => (KEY_DOT, false),
        '>' => (KEY_DOT, true),
        '/' => (KEY_SLASH, false),
        '?' => (KEY_SLASH, true),
        '!' => (KEY_1, true),
        '@' => (KEY_2, true),
        '#' => (KEY_3, true),
        '$' => (KEY_4, true),
        '%' => (KEY_5, true),
        '^' => (KEY_6, true),
        '&' => (KEY_7, true),
        '*' => (KEY_8, true),
        '(' => (KEY_9, true),
        ')' => (KEY_0, true),
        _ => return None,
    };
    Some((Key::new(code), shift))
}

fn letter_code(ch: char) -> Option<u16> {
    let mut buf = [0u8; 4];
    let name = format!("KEY_{}", ch.to_ascii_uppercase().encode_utf8(&mut buf));
    KEY_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|&(_, code)| code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(key_from_name("KEY_A"), Some(Key::KEY_A));
        assert_eq!(key_from_name("KEY_ENTER"), Some(Key::KEY_ENTER));
        assert_eq!(key_from_name("KEY_LEFTSHIFT"), Some(Key::KEY_LEFTSHIFT));
        assert_eq!(key_from_name("KEY_F24"), Some(Key::KEY_F24));
        assert_eq!(key_from_name("KEY_NOPE"), None);
        assert_eq!(key_from_name("key_a"), None);
    }

    #[test]
    fn test_reverse_lookup() {
        assert_eq!(key_name(Key::KEY_SPACE), Some("KEY_SPACE"));
        assert_eq!(key_name(Key::new(0x2ff)), None);
    }

    #[test]
    fn test_table_has_no_duplicate_names_or_codes() {
        let names: HashSet<_> = KEY_TABLE.iter().map(|(name, _)| *name).collect();
        let codes: HashSet<_> = KEY_TABLE.iter().map(|(_, code)| *code).collect();
        assert_eq!(names.len(), KEY_TABLE.len());
        assert_eq!(codes.len(), KEY_TABLE.len());
    }

    #[test]
    fn test_supported_keys_cover_table() {
        let keys = supported_keys();
        assert_eq!(keys.iter().count(), KEY_TABLE.len());
        assert!(keys.contains(Key::KEY_Z));
        assert!(keys.contains(Key::KEY_KPENTER));
    }

    #[test]
    fn test_modifier_keys() {
        assert_eq!(modifier_key("shift"), Some(Key::KEY_LEFTSHIFT));
        assert_eq!(modifier_key("Ctrl"), Some(Key::KEY_LEFTCTRL));
        assert_eq!(modifier_key("altgr"), Some(Key::KEY_RIGHTALT));
        assert_eq!(modifier_key("super"), Some(Key::KEY_LEFTMETA));
        assert_eq!(modifier_key("hyper"), None);
    }

    #[test]
    fn test_ascii_mapping() {
        assert_eq!(ascii_to_key('a'), Some((Key::KEY_A, false)));
        assert_eq!(ascii_to_key('Q'), Some((Key::KEY_Q, true)));
        assert_eq!(ascii_to_key('1'), Some((Key::KEY_1, false)));
        assert_eq!(ascii_to_key('9'), Some((Key::KEY_9, false)));
        assert_eq!(ascii_to_key('0'), Some((Key::KEY_0, false)));
        assert_eq!(ascii_to_key('?'), Some((Key::KEY_SLASH, true)));
        assert_eq!(ascii_to_key('é'), None);
    }
}
