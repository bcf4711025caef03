//! Virtual Device Error Types

use thiserror::Error;

/// Result type for virtual device operations
pub type Result<T> = std::result::Result<T, DeviceError>;

/// Virtual device error types
#[derive(Error, Debug)]
pub enum DeviceError {
    /// `/dev/uinput` could not be opened for writing
    #[error("Permission denied opening /dev/uinput: {0}")]
    PermissionDenied(String),

    /// Device node creation or capability registration failed
    #[error("Failed to create virtual device '{name}': {reason}")]
    CreationFailed {
        /// Product name of the device
        name: String,
        /// Underlying failure
        reason: String,
    },

    /// Writing an event to the device failed
    #[error("Failed to write input event: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Worker thread could not be spawned
    #[error("Failed to spawn worker thread: {0}")]
    ThreadSpawnFailed(#[source] std::io::Error),

    /// The event queue is full, the event was dropped
    #[error("Event queue is full")]
    QueueFull,

    /// The device is permanently disabled after an initialization failure
    #[error("Device is disabled")]
    Disabled,

    /// The device worker has been stopped
    #[error("Device is stopped")]
    Stopped,
}

impl DeviceError {
    /// Classify an I/O error raised while creating a device
    pub fn from_creation(name: &str, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            DeviceError::PermissionDenied(err.to_string())
        } else {
            DeviceError::CreationFailed {
                name: name.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Whether this error permanently disables the device
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DeviceError::PermissionDenied(_)
                | DeviceError::CreationFailed { .. }
                | DeviceError::ThreadSpawnFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_permission_denied_classification() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = DeviceError::from_creation("kbd", err);
        assert!(matches!(err, DeviceError::PermissionDenied(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_other_creation_failure() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such device");
        let err = DeviceError::from_creation("kbd", err);
        match &err {
            DeviceError::CreationFailed { name, .. } => assert_eq!(name, "kbd"),
            other => panic!("Expected CreationFailed, got {:?}", other),
        }
        assert!(err.to_string().contains("kbd"));
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let err = DeviceError::WriteFailed(io::Error::new(io::ErrorKind::Other, "EIO"));
        assert!(!err.is_fatal());
        assert!(!DeviceError::QueueFull.is_fatal());
    }
}
