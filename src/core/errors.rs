/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Result type for synchronized word operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Reasons a region cannot host a synchronized word
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BindError {
    #[error("Region too small: {len} bytes, need 4 bytes at offset {offset}")]
    #[diagnostic(
        code(bind::region_too_small),
        help("The word needs 4 bytes starting at the requested offset.")
    )]
    RegionTooSmall { len: usize, offset: usize },

    #[error("Word address {address:#x} is not 4-byte aligned")]
    #[diagnostic(
        code(bind::misaligned),
        help("Pick a region start or offset that is a multiple of 4.")
    )]
    Misaligned { address: usize },
}

/// Synchronized word errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(code(sync::invalid_argument))]
    InvalidArgument(#[from] BindError),

    #[error("Wait queue operation failed: {} (os error {code})", describe_os_error(.code))]
    #[diagnostic(
        code(sync::os_error),
        help("The kernel rejected the wait/wake call. Check that the region is still mapped.")
    )]
    Os { code: i32 },

    #[error("Wait was cancelled")]
    #[diagnostic(
        code(sync::cancelled),
        help("The blocking task backing an async wait did not complete.")
    )]
    Cancelled,
}

impl SyncError {
    /// Build an OS error from the calling thread's last errno
    pub fn last_os_error() -> Self {
        Self::from_io(&io::Error::last_os_error())
    }

    pub(crate) fn from_io(err: &io::Error) -> Self {
        Self::Os {
            code: err.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// Platform error code, if this is an OS error
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Os { code } => Some(*code),
            _ => None,
        }
    }

    /// True when a blocking wait was interrupted by a signal
    pub fn is_interrupted(&self) -> bool {
        self.raw_os_error() == Some(libc::EINTR)
    }
}

impl From<SyncError> for io::Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Os { code } => io::Error::from_raw_os_error(code),
            SyncError::InvalidArgument(e) => io::Error::new(io::ErrorKind::InvalidInput, e),
            SyncError::Cancelled => {
                io::Error::new(io::ErrorKind::Interrupted, SyncError::Cancelled)
            }
        }
    }
}

fn describe_os_error(code: &i32) -> String {
    io::Error::from_raw_os_error(*code).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bind_error_names_condition() {
        let small = SyncError::from(BindError::RegionTooSmall { len: 3, offset: 0 });
        assert!(small.to_string().contains("too small"));

        let misaligned = SyncError::from(BindError::Misaligned { address: 0x1001 });
        assert!(misaligned.to_string().contains("0x1001"));
        assert!(misaligned.to_string().contains("aligned"));
    }

    #[test]
    fn test_os_error_code() {
        let err = SyncError::Os { code: libc::EINTR };
        assert_eq!(err.raw_os_error(), Some(libc::EINTR));
        assert!(err.is_interrupted());

        let io_err: io::Error = err.into();
        assert_eq!(io_err.raw_os_error(), Some(libc::EINTR));
    }

    #[test]
    fn test_error_serialization() {
        let err = SyncError::Os { code: libc::EFAULT };
        let json = serde_json::to_string(&err).unwrap();
        let back: SyncError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
