//! System Diagnostics
//!
//! Checks the prerequisites for creating virtual input devices and reports
//! the runtime environment.

use nix::unistd::{access, getgroups, geteuid, AccessFlags, Group};
use std::fmt;
use std::path::{Path, PathBuf};
use sysinfo::System;
use tracing::{info, warn};

/// uinput control node
pub const UINPUT_PATH: &str = "/dev/uinput";

/// System information for diagnostics
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Operating system name (e.g., "Linux", "Ubuntu")
    pub os_name: String,
    /// Operating system version string
    pub os_version: String,
    /// Kernel version string
    pub kernel_version: String,
    /// System hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Gather system information
    pub fn gather() -> Self {
        Self {
            os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    /// Log system information
    pub fn log(&self) {
        info!("=== System Information ===");
        info!("  OS: {} {}", self.os_name, self.os_version);
        info!("  Kernel: {}", self.kernel_version);
        info!("  Hostname: {}", self.hostname);
    }
}

/// Access to the uinput node for the current process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UinputAccess {
    /// Checked path
    pub path: PathBuf,
    /// Node exists
    pub exists: bool,
    /// Node is writable by this process
    pub writable: bool,
    /// Effective user id
    pub euid: u32,
    /// Process is in the `input` group
    pub in_input_group: bool,
}

impl UinputAccess {
    /// Check the default uinput node
    pub fn check() -> Self {
        Self::check_path(UINPUT_PATH)
    }

    /// Check a specific node
    pub fn check_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let in_input_group = match (Group::from_name("input"), getgroups()) {
            (Ok(Some(group)), Ok(groups)) => groups.contains(&group.gid),
            _ => false,
        };

        Self {
            path: path.to_path_buf(),
            exists: path.exists(),
            writable: access(path, AccessFlags::W_OK).is_ok(),
            euid: geteuid().as_raw(),
            in_input_group,
        }
    }

    /// Whether virtual devices can be created
    pub fn is_usable(&self) -> bool {
        self.exists && self.writable
    }

    /// Log the result, with a hint when access is missing
    pub fn log(&self) {
        if self.is_usable() {
            info!("{} is writable (euid {})", self.path.display(), self.euid);
            return;
        }

        if !self.exists {
            warn!("{} does not exist", self.path.display());
            warn!("Load the module: sudo modprobe uinput");
        } else {
            warn!("{} is not writable (euid {})", self.path.display(), self.euid);
            if !self.in_input_group {
                warn!("Run: sudo usermod -a -G input $USER");
            }
        }
        warn!("Virtual devices will be disabled");
    }
}

impl fmt::Display for UinputAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let yes_no = |v: bool| if v { "yes" } else { "no" };
        writeln!(f, "uinput node:     {}", self.path.display())?;
        writeln!(f, "  exists:        {}", yes_no(self.exists))?;
        writeln!(f, "  writable:      {}", yes_no(self.writable))?;
        writeln!(f, "  effective uid: {}", self.euid)?;
        write!(f, "  input group:   {}", yes_no(self.in_input_group))
    }
}

/// Log system and uinput status at startup
pub fn log_startup_diagnostics() -> UinputAccess {
    SystemInfo::gather().log();
    let access = UinputAccess::check();
    access.log();
    access
}
