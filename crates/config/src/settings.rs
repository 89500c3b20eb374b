use std::{path::PathBuf, time::Duration};

use mediakeys_protocol::Source;
use serde::{Deserialize, Serialize};

use crate::{
    default_socket_path,
    defaults::{
        default_browser_bundle_ids, default_browsers, default_enabled, default_fallback,
        default_native_bundle_ids, default_poll_interval_ms, default_staleness_ms,
        default_sticky_ms, default_tie_break,
    },
};

/// Lower bound for the poller cadence.
const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Target resolution policy knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Sticky window in milliseconds. Zero disables stickiness.
    #[serde(default = "default_sticky_ms")]
    pub sticky_ms: u64,
    /// Staleness window in milliseconds.
    #[serde(default = "default_staleness_ms")]
    pub staleness_ms: u64,
    /// Total order used to break ties; must list every source once.
    #[serde(default = "default_tie_break")]
    pub tie_break: Vec<Source>,
    /// Source tried last when it is available.
    #[serde(default = "default_fallback")]
    pub fallback: Option<Source>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            sticky_ms: default_sticky_ms(),
            staleness_ms: default_staleness_ms(),
            tie_break: default_tie_break(),
            fallback: default_fallback(),
        }
    }
}

impl Policy {
    /// Sticky window as a duration.
    pub fn sticky(&self) -> Duration {
        Duration::from_millis(self.sticky_ms)
    }

    /// Staleness window as a duration.
    pub fn staleness(&self) -> Duration {
        Duration::from_millis(self.staleness_ms)
    }

    /// Check invariants the resolver relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.staleness_ms == 0 {
            return Err("policy.staleness_ms must be greater than zero".to_string());
        }
        let mut seen = [false; Source::COUNT];
        for s in &self.tie_break {
            if seen[s.index()] {
                return Err(format!("policy.tie_break lists {} more than once", s));
            }
            seen[s.index()] = true;
        }
        if let Some(missing) = Source::ALL.iter().find(|s| !seen[s.index()]) {
            return Err(format!("policy.tie_break is missing {}", missing));
        }
        Ok(())
    }
}

/// Bundle identifier lists used to classify the frontmost application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FocusRules {
    /// Native media applications (owners of native sources).
    #[serde(default = "default_native_bundle_ids")]
    pub native_bundle_ids: Vec<String>,
    /// Browsers (owners of browser-hosted sources).
    #[serde(default = "default_browser_bundle_ids")]
    pub browser_bundle_ids: Vec<String>,
}

impl Default for FocusRules {
    fn default() -> Self {
        Self {
            native_bundle_ids: default_native_bundle_ids(),
            browser_bundle_ids: default_browser_bundle_ids(),
        }
    }
}

/// Complete user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Persisted enable switch; when false keys pass through untouched.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Resolution policy.
    #[serde(default)]
    pub policy: Policy,
    /// Poll cadence for the Spotify and YouTube probes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Frontmost-application classification.
    #[serde(default)]
    pub focus: FocusRules,
    /// AppleScript browser names tried when driving tabs directly.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
    /// Control socket override.
    #[serde(default)]
    pub socket: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            policy: Policy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            focus: FocusRules::default(),
            browsers: default_browsers(),
            socket: None,
        }
    }
}

impl Settings {
    /// Effective control socket path.
    pub fn socket_path(&self) -> PathBuf {
        self.socket.clone().unwrap_or_else(default_socket_path)
    }

    /// Poll cadence as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check all invariants.
    pub fn validate(&self) -> Result<(), String> {
        self.policy.validate()?;
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            return Err(format!(
                "poll_interval_ms must be at least {}",
                MIN_POLL_INTERVAL_MS
            ));
        }
        Ok(())
    }
}
