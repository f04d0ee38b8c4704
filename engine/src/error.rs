use thiserror::Error;

#[cfg(unix)]
use nix::libc;

#[cfg(unix)]
pub const ENODEV: i32 = libc::ENODEV;
#[cfg(not(unix))]
pub const ENODEV: i32 = 19;

#[cfg(unix)]
pub const EINVAL: i32 = libc::EINVAL;
#[cfg(not(unix))]
pub const EINVAL: i32 = 22;

#[cfg(unix)]
pub const EINTR: i32 = libc::EINTR;
#[cfg(not(unix))]
pub const EINTR: i32 = 4;

#[cfg(unix)]
pub const EIO: i32 = libc::EIO;
#[cfg(not(unix))]
pub const EIO: i32 = 5;

/// A failed control subsystem operation. Recoverable: the session reports it
/// and keeps listening.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct CtlError {
    pub op: &'static str,
    pub errno: i32,
    pub reason: String,
}

impl CtlError {
    pub fn new(op: &'static str, errno: i32, reason: impl Into<String>) -> Self {
        Self {
            op,
            errno,
            reason: reason.into(),
        }
    }
}

/// A fatal session failure. `main` prints it and exits with the propagated
/// negative subsystem error code.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Control {device} open error: {reason}")]
    Open {
        device: String,
        errno: i32,
        reason: String,
    },

    #[error("Control {device} load error: {reason}")]
    Load {
        device: String,
        errno: i32,
        reason: String,
    },

    #[error("Control '{name}' not found on {device}")]
    NotFound { device: String, name: String },

    #[error("No Control found for {device}")]
    NoControls { device: String },
}

impl MonitorError {
    pub(crate) fn open(device: &str, err: CtlError) -> Self {
        Self::Open {
            device: device.to_string(),
            errno: err.errno,
            reason: err.reason,
        }
    }

    pub(crate) fn load(device: &str, err: CtlError) -> Self {
        Self::Load {
            device: device.to_string(),
            errno: err.errno,
            reason: err.reason,
        }
    }

    pub fn errno(&self) -> i32 {
        match self {
            Self::Open { errno, .. } | Self::Load { errno, .. } => *errno,
            Self::NotFound { .. } | Self::NoControls { .. } => ENODEV,
        }
    }

    pub fn exit_code(&self) -> i32 {
        -self.errno()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_carry_negative_exit_codes() {
        let err = MonitorError::NotFound {
            device: "hw:0".to_string(),
            name: "Bell".to_string(),
        };
        assert_eq!(err.errno(), ENODEV);
        assert_eq!(err.exit_code(), -ENODEV);
        assert_eq!(err.to_string(), "Control 'Bell' not found on hw:0");
    }

    #[test]
    fn open_error_names_device_and_reason() {
        let err = MonitorError::open("hw:3", CtlError::new("open", 2, "No such file or directory"));
        assert_eq!(
            err.to_string(),
            "Control hw:3 open error: No such file or directory"
        );
        assert_eq!(err.errno(), 2);
    }

    #[test]
    fn no_controls_message() {
        let err = MonitorError::NoControls {
            device: "sysdefault:1".to_string(),
        };
        assert_eq!(err.to_string(), "No Control found for sysdefault:1");
    }
}
