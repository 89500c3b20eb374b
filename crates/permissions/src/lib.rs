//! Simple permission checks for the media key daemon.
//!
//! Intercepting media keys needs an active event tap, which macOS gates behind
//! Accessibility; Input Monitoring is reported alongside it because some
//! releases ask for both. On other platforms every check reports `true`.
//!
//! Notes
//! - `accessibility_ok()` checks the global Accessibility permission.
//! - `request_accessibility()` does the same but lets the OS show its prompt.
//! - `check_permissions()` returns both as a simple status struct.

use serde::{Deserialize, Serialize};

#[cfg(target_os = "macos")]
mod sys {
    use core_foundation::{
        base::TCFType,
        boolean::CFBoolean,
        dictionary::{CFDictionary, CFDictionaryRef},
        string::{CFString, CFStringRef},
    };

    #[link(name = "ApplicationServices", kind = "framework")]
    unsafe extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
        fn CGPreflightListenEventAccess() -> bool;
        static kAXTrustedCheckOptionPrompt: CFStringRef;
    }

    pub fn accessibility_ok() -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    pub fn request_accessibility() -> bool {
        // SAFETY: framework constant, valid for the process lifetime.
        let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
        let opts = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
        unsafe { AXIsProcessTrustedWithOptions(opts.as_concrete_TypeRef()) }
    }

    pub fn input_monitoring_ok() -> bool {
        unsafe { CGPreflightListenEventAccess() }
    }
}

#[cfg(not(target_os = "macos"))]
mod sys {
    pub fn accessibility_ok() -> bool {
        true
    }

    pub fn request_accessibility() -> bool {
        true
    }

    pub fn input_monitoring_ok() -> bool {
        true
    }
}

/// Check if the process is trusted for Accessibility (required to create an
/// active event tap).
pub fn accessibility_ok() -> bool {
    sys::accessibility_ok()
}

/// Like [`accessibility_ok`], but asks macOS to show its permission prompt
/// when the process is not yet trusted.
pub fn request_accessibility() -> bool {
    sys::request_accessibility()
}

/// Check if the application has the "Input Monitoring" permission.
pub fn input_monitoring_ok() -> bool {
    sys::input_monitoring_ok()
}

/// Current permission status for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionsStatus {
    /// Accessibility (AX) permission; `true` if granted.
    pub accessibility_ok: bool,
    /// Input Monitoring permission; `true` if granted.
    pub input_ok: bool,
}

/// Query both Accessibility and Input Monitoring permissions without prompting.
pub fn check_permissions() -> PermissionsStatus {
    PermissionsStatus {
        accessibility_ok: accessibility_ok(),
        input_ok: input_monitoring_ok(),
    }
}
