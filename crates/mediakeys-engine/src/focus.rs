//! Frontmost-application signal.

use std::fmt;

use config::FocusRules;
use mediakeys_protocol::{Source, SourceFamily};

/// Which category of application is frontmost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FocusSignal {
    /// A native media application.
    Native,
    /// A web browser.
    Browser,
    /// Anything else, or the query failed.
    #[default]
    Neither,
}

impl FocusSignal {
    /// Classify a bundle identifier. Unknown or missing ids map to `Neither`.
    pub fn classify(bundle_id: Option<&str>, rules: &FocusRules) -> Self {
        let Some(id) = bundle_id else {
            return Self::Neither;
        };
        if rules.native_bundle_ids.iter().any(|b| b == id) {
            Self::Native
        } else if rules.browser_bundle_ids.iter().any(|b| b == id) {
            Self::Browser
        } else {
            Self::Neither
        }
    }

    /// Source family owned by the frontmost application, if any.
    pub fn family(self) -> Option<SourceFamily> {
        match self {
            Self::Native => Some(SourceFamily::Native),
            Self::Browser => Some(SourceFamily::Browser),
            Self::Neither => None,
        }
    }

    /// True if the frontmost application owns `source`.
    pub fn owns(self, source: Source) -> bool {
        self.family() == Some(source.family())
    }
}

impl fmt::Display for FocusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Native => "native",
            Self::Browser => "browser",
            Self::Neither => "neither",
        })
    }
}

/// Synchronous, always-fresh focus query.
///
/// Called on the key path, so implementations must not block.
pub trait FocusProbe: Send + Sync {
    /// Current focus category.
    fn focus(&self) -> FocusSignal;
}

/// Probe backed by the NSWorkspace frontmost application.
#[derive(Debug)]
pub struct SystemFocus {
    /// Bundle id lists.
    rules: FocusRules,
}

impl SystemFocus {
    /// Probe using `rules`.
    pub fn new(rules: FocusRules) -> Self {
        Self { rules }
    }
}

impl FocusProbe for SystemFocus {
    fn focus(&self) -> FocusSignal {
        let bundle = mac_focus::frontmost_bundle_id();
        FocusSignal::classify(bundle.as_deref(), &self.rules)
    }
}
