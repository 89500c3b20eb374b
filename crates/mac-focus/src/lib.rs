//! mac-focus: ask NSWorkspace which application is frontmost and whether a
//! given application is running.
//!
//! Queries are synchronous and cheap enough to run on every media key press.
//! On platforms other than macOS every query reports
//! [`Error::Unsupported`] or "not running".

use thiserror::Error;

#[cfg(target_os = "macos")]
mod ns;

/// Errors returned by focus queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// NSWorkspace reported no frontmost application.
    #[error("no frontmost application")]
    NoFrontmostApp,
    /// Focus queries need AppKit.
    #[error("focus queries are not supported on this platform")]
    Unsupported,
}

/// Identity of the frontmost application.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrontApp {
    /// Bundle identifier, when the application has one.
    pub bundle_id: Option<String>,
    /// Localized display name.
    pub name: Option<String>,
    /// Process identifier.
    pub pid: i32,
}

/// Query the frontmost application.
pub fn frontmost_app() -> Result<FrontApp, Error> {
    #[cfg(target_os = "macos")]
    {
        ns::frontmost_app()
    }
    #[cfg(not(target_os = "macos"))]
    {
        Err(Error::Unsupported)
    }
}

/// Bundle identifier of the frontmost application, if any.
pub fn frontmost_bundle_id() -> Option<String> {
    match frontmost_app() {
        Ok(app) => app.bundle_id,
        Err(e) => {
            tracing::trace!(error = %e, "frontmost_app_unavailable");
            None
        }
    }
}

/// True if at least one instance of `bundle_id` is running.
pub fn is_running(bundle_id: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        ns::is_running(bundle_id)
    }
    #[cfg(not(target_os = "macos"))]
    {
        let _ = bundle_id;
        false
    }
}

#[cfg(all(test, not(target_os = "macos")))]
mod tests {
    use super::*;

    #[test]
    fn queries_degrade_off_macos() {
        assert_eq!(frontmost_app(), Err(Error::Unsupported));
        assert_eq!(frontmost_bundle_id(), None);
        assert!(!is_running("com.spotify.client"));
    }
}
