//! Error taxonomy and the process-wide "last error" slot.
//!
//! Every fallible entry point returns a [`BlitError`] and also records its
//! message with [`set_error`], so callers that only look at a sentinel can
//! still recover the reason through [`get_error`].

use std::fmt;

use parking_lot::Mutex;

/// Which side of a two-surface operation an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    Source,
    Destination,
}

impl fmt::Display for SurfaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceRole::Source => write!(f, "source"),
            SurfaceRole::Destination => write!(f, "destination"),
        }
    }
}

/// A surface's backing memory could not be prepared for direct access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("surface {surface} is unavailable for direct pixel access")]
pub struct LockError {
    pub surface: u64,
}

/// Errors raised by the blit, stretch and surface APIs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlitError {
    #[error("Only works with same format surfaces")]
    FormatMismatch,

    #[error("Invalid {0} blit rectangle")]
    InvalidRectangle(SurfaceRole),

    #[error("Unable to lock {role} surface")]
    LockFailure {
        role: SurfaceRole,
        #[source]
        source: LockError,
    },

    #[error("Invalid pixel format: {0}")]
    InvalidFormat(String),

    #[error("Palette of {0} colors exceeds 256 entries")]
    PaletteTooLarge(usize),

    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid pitch {pitch} for {width} pixels of {bytes_per_pixel} bytes ({len} bytes supplied)")]
    InvalidPitch {
        pitch: usize,
        width: u32,
        bytes_per_pixel: usize,
        len: usize,
    },
}

impl BlitError {
    /// Record this error as the last error and hand it back.
    pub fn report(self) -> Self {
        set_error(self.to_string());
        self
    }
}

static LAST_ERROR: Mutex<String> = parking_lot::const_mutex(String::new());

/// Replace the last error message.
pub fn set_error(message: impl Into<String>) {
    let message = message.into();
    log::debug!("set_error: {}", message);
    *LAST_ERROR.lock() = message;
}

/// The most recently recorded error message (empty if none).
pub fn get_error() -> String {
    LAST_ERROR.lock().clone()
}

/// Forget the last error.
pub fn clear_error() {
    LAST_ERROR.lock().clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            BlitError::FormatMismatch.to_string(),
            "Only works with same format surfaces"
        );
        assert_eq!(
            BlitError::InvalidRectangle(SurfaceRole::Source).to_string(),
            "Invalid source blit rectangle"
        );
        assert_eq!(
            BlitError::InvalidRectangle(SurfaceRole::Destination).to_string(),
            "Invalid destination blit rectangle"
        );
        let lock = BlitError::LockFailure {
            role: SurfaceRole::Destination,
            source: LockError { surface: 7 },
        };
        assert_eq!(lock.to_string(), "Unable to lock destination surface");
    }

    #[test]
    fn test_lock_failure_has_source() {
        use std::error::Error;
        let err = BlitError::LockFailure {
            role: SurfaceRole::Source,
            source: LockError { surface: 3 },
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("surface 3 is unavailable for direct pixel access")
        );
    }

    #[test]
    #[serial]
    fn test_set_get_clear_error() {
        clear_error();
        assert!(get_error().is_empty());

        set_error("first");
        assert_eq!(get_error(), "first");

        set_error(String::from("second"));
        assert_eq!(get_error(), "second");

        clear_error();
        assert_eq!(get_error(), "");
    }

    #[test]
    #[serial]
    fn test_report_records_message() {
        clear_error();
        let err = BlitError::FormatMismatch.report();
        assert_eq!(err, BlitError::FormatMismatch);
        assert_eq!(get_error(), "Only works with same format surfaces");
    }
}
