//! Error types and result alias for the mac-mediakey crate.
use std::result::Result as StdResult;

use thiserror::Error;

/// Convenient result type used throughout this crate.
pub type Result<T> = StdResult<T, Error>;

/// Error variants produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Event tap could not be created or initialized.
    #[error("Event tap failed to start")]
    EventTapStart,
    /// Missing or denied system permission.
    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),
    /// The tap thread could not be spawned or exited before reporting readiness.
    #[error("Tap thread error: {0}")]
    Thread(String),
    /// Media key interception is only available on macOS.
    #[error("Media key interception is not supported on this platform")]
    Unsupported,
}
