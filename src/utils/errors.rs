//! User-Friendly Error Formatting
//!
//! Turns errors into operator-facing messages with troubleshooting hints for
//! the usual suspects: uinput permissions, layout files and config files.

use std::fmt::Write;

use crate::device::DeviceError;
use crate::layout::LayoutError;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Uinput,
    Layout,
    Config,
    Generic,
}

fn categorize(error: &anyhow::Error) -> Category {
    for cause in error.chain() {
        if cause.downcast_ref::<DeviceError>().is_some() {
            return Category::Uinput;
        }
        if cause.downcast_ref::<LayoutError>().is_some() {
            return Category::Layout;
        }
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return Category::Config;
        }
    }

    let message = format!("{:#}", error).to_lowercase();
    if message.contains("uinput") || message.contains("permission denied") {
        Category::Uinput
    } else if message.contains("layout") {
        Category::Layout
    } else if message.contains("config") {
        Category::Config
    } else {
        Category::Generic
    }
}

/// Format error for user consumption
///
/// Produces a boxed message with likely causes, the full error chain, and
/// where to look next.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    writeln!(output).ok();
    writeln!(output, "╔════════════════════════════════════════════════════════════╗").ok();
    writeln!(output, "║                         ERROR                              ║").ok();
    writeln!(output, "╚════════════════════════════════════════════════════════════╝").ok();
    writeln!(output).ok();

    match categorize(error) {
        Category::Uinput => format_uinput_error(&mut output),
        Category::Layout => format_layout_error(&mut output),
        Category::Config => format_config_error(&mut output),
        Category::Generic => format_generic_error(&mut output, &error.to_string()),
    }

    writeln!(output).ok();
    writeln!(output, "{}", RULE).ok();
    writeln!(output, "Technical Details:").ok();
    writeln!(output).ok();
    writeln!(output, "{:#}", error).ok();
    writeln!(output).ok();
    writeln!(output, "{}", RULE).ok();
    writeln!(output, "Need Help?").ok();
    writeln!(output, "  - Run with more verbosity: yogaboard-input -vvv ...").ok();
    writeln!(output, "  - Check device access:     yogaboard-input diagnose").ok();

    output
}

fn format_uinput_error(output: &mut String) {
    writeln!(output, "Virtual Input Device Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not create a virtual device through /dev/uinput.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. No write permission on /dev/uinput").ok();
    writeln!(output, "     → Run: sudo usermod -a -G input $USER").ok();
    writeln!(output, "     → Log out and back in for the group to apply").ok();
    writeln!(output).ok();
    writeln!(output, "  2. uinput module not loaded").ok();
    writeln!(output, "     → Run: sudo modprobe uinput").ok();
    writeln!(output, "     → Persist: echo uinput | sudo tee /etc/modules-load.d/uinput.conf").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Missing udev rule for the input group").ok();
    writeln!(
        output,
        "     → Add: KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\""
    )
    .ok();
}

fn format_layout_error(output: &mut String) {
    writeln!(output, "Layout Error").ok();
    writeln!(output).ok();
    writeln!(output, "The keyboard layout file could not be used.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Invalid JSON syntax").ok();
    writeln!(output, "     → Check for trailing commas and missing quotes").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Unknown key name").ok();
    writeln!(output, "     → List valid names: yogaboard-input keys").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Modifier key without a modifier name").ok();
    writeln!(
        output,
        "     → Set \"modifier\" to shift, ctrl, alt, altgr or super"
    )
    .ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with the configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(output, "     → Default location: ~/.config/yogaboard/config.toml").ok();
    writeln!(output, "     → Or specify: yogaboard-input -c /path/to/config.toml").ok();
    writeln!(output, "     → Print the defaults: yogaboard-input config").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax or value").ok();
    writeln!(output, "     → Sensitivities must be positive").ok();
    writeln!(output, "     → touchpad.mode is \"gestures\" or \"passthrough\"").ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Input Error").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
}
