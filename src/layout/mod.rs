//! Keyboard Layout Files
//!
//! Layouts are JSON documents describing rows of key buttons:
//!
//! ```json
//! {
//!   "name": "slim",
//!   "window_height": 220,
//!   "rows": [
//!     { "keys": [
//!       { "label": "Esc", "key": "KEY_ESC" },
//!       { "label": "Shift", "key": "KEY_LEFTSHIFT", "width": 1.5,
//!         "is_modifier": true, "modifier": "shift" },
//!       { "label": "1/F1", "key": "KEY_1", "top": "KEY_1", "bottom": "KEY_F1" },
//!       { "label": "×", "key": "SPECIAL_CLOSE" }
//!     ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::device::{key_from_name, modifier_key};
use crate::input::key_press::{AppAction, SPECIAL_PREFIX};

/// Layout loading errors
#[derive(Error, Debug)]
pub enum LayoutError {
    /// File could not be read
    #[error("Failed to read layout {path}: {source}")]
    Io {
        /// Layout path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid layout document
    #[error("Failed to parse layout: {0}")]
    Parse(#[from] serde_json::Error),

    /// Layout has no keys
    #[error("Layout '{0}' has no keys")]
    Empty(String),

    /// A key name is not in the key table
    #[error("Unknown key '{key}' at row {row}, position {position}")]
    UnknownKey {
        /// Offending key name
        key: String,
        /// Row index
        row: usize,
        /// Key index in the row
        position: usize,
    },

    /// A modifier key does not name a known modifier
    #[error("Modifier key '{label}' at row {row} needs a modifier (shift, ctrl, alt, altgr, super)")]
    MissingModifier {
        /// Key label
        label: String,
        /// Row index
        row: usize,
    },

    /// Key width is not positive
    #[error("Key '{label}' at row {row} has invalid width {width}")]
    InvalidWidth {
        /// Key label
        label: String,
        /// Row index
        row: usize,
        /// Width from the file
        width: f64,
    },
}

/// Layout result type
pub type Result<T> = std::result::Result<T, LayoutError>;

fn default_width() -> f64 {
    1.0
}

/// One key button
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDef {
    /// Text on the button
    pub label: String,
    /// Key name (`KEY_*` or `SPECIAL_*`)
    pub key: String,
    /// Width in key units
    #[serde(default = "default_width")]
    pub width: f64,
    /// Whether the key is a modifier
    #[serde(default)]
    pub is_modifier: bool,
    /// Modifier name for modifier keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    /// Key sent when the upper half is pressed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    /// Key sent when the lower half is pressed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<String>,
}

impl KeyDef {
    /// Plain key of width 1
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
            width: default_width(),
            is_modifier: false,
            modifier: None,
            top: None,
            bottom: None,
        }
    }

    /// Whether this key triggers an application action
    pub fn is_special(&self) -> bool {
        self.key.starts_with(SPECIAL_PREFIX)
    }

    /// Whether the key has separate top and bottom halves
    pub fn is_split(&self) -> bool {
        self.top.is_some() && self.bottom.is_some()
    }
}

/// One row of keys
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Row height relative to the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Keys left to right
    pub keys: Vec<KeyDef>,
}

/// Complete keyboard layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Layout name
    pub name: String,
    /// Preferred window height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_height: Option<u32>,
    /// Rows top to bottom
    pub rows: Vec<Row>,
}

impl Layout {
    /// Read and validate a layout file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = Self::from_json(&content)?;
        debug!(
            "Loaded layout '{}' from {}: {} rows, {} keys",
            layout.name,
            path.display(),
            layout.rows.len(),
            layout.key_count()
        );
        Ok(layout)
    }

    /// Parse and validate a layout document
    pub fn from_json(json: &str) -> Result<Self> {
        let layout: Layout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Check every key against the key table
    pub fn validate(&self) -> Result<()> {
        if self.key_count() == 0 {
            return Err(LayoutError::Empty(self.name.clone()));
        }

        for (row_index, row) in self.rows.iter().enumerate() {
            for (position, key) in row.keys.iter().enumerate() {
                let unknown = |name: &str| LayoutError::UnknownKey {
                    key: name.to_string(),
                    row: row_index,
                    position,
                };

                if !(key.width > 0.0 && key.width.is_finite()) {
                    return Err(LayoutError::InvalidWidth {
                        label: key.label.clone(),
                        row: row_index,
                        width: key.width,
                    });
                }

                if key.is_special() {
                    if AppAction::from_key_name(&key.key).is_none() {
                        return Err(unknown(&key.key));
                    }
                    continue;
                }

                if key_from_name(&key.key).is_none() {
                    return Err(unknown(&key.key));
                }
                for half in [&key.top, &key.bottom].into_iter().flatten() {
                    if key_from_name(half).is_none() {
                        return Err(unknown(half));
                    }
                }

                if key.is_modifier && key.modifier.as_deref().and_then(modifier_key).is_none() {
                    return Err(LayoutError::MissingModifier {
                        label: key.label.clone(),
                        row: row_index,
                    });
                }
            }
        }

        Ok(())
    }

    /// Total number of keys
    pub fn key_count(&self) -> usize {
        self.rows.iter().map(|r| r.keys.len()).sum()
    }

    /// Iterate over every key
    pub fn keys(&self) -> impl Iterator<Item = &KeyDef> {
        self.rows.iter().flat_map(|r| r.keys.iter())
    }

    /// Names of the modifiers the layout offers
    pub fn modifiers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .keys()
            .filter(|k| k.is_modifier)
            .filter_map(|k| k.modifier.as_deref())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Special actions the layout offers
    pub fn actions(&self) -> Vec<AppAction> {
        self.keys()
            .filter(|k| k.is_special())
            .filter_map(|k| AppAction::from_key_name(&k.key))
            .collect()
    }
}
