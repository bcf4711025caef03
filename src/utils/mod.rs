//! Utility Functions and Diagnostics
//!
//! Environment checks and user-friendly error formatting.
//!
//! ## Diagnostics
//!
//! The [`diagnostics`] module checks whether virtual devices can be created:
//!
//! ```rust,no_run
//! use yogaboard_input::utils::UinputAccess;
//!
//! let access = UinputAccess::check();
//! if !access.is_usable() {
//!     println!("{}", access);
//! }
//! ```
//!
//! **CLI access:**
//! ```bash
//! yogaboard-input diagnose
//! ```
//!
//! ## Error Formatting
//!
//! The [`errors`] module renders errors with troubleshooting hints:
//!
//! ```rust,ignore
//! use yogaboard_input::utils::format_user_error;
//!
//! if let Err(e) = run() {
//!     eprintln!("{}", format_user_error(&e));
//! }
//! ```
//!
//! Error categories with context-aware help:
//! - uinput errors → group membership, module loading, udev rule
//! - Layout errors → JSON syntax, valid key names, modifier names
//! - Config errors → file location, value ranges

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{log_startup_diagnostics, SystemInfo, UinputAccess, UINPUT_PATH};
pub use errors::format_user_error;
