//! Default values for every settings field.

use mediakeys_protocol::Source;

/// Media keys are captured unless the user turned them off.
pub const ENABLED: bool = true;

/// Window after a dispatch during which the same target is reused.
pub const STICKY_MS: u64 = 1000;

/// Maximum age of an observation before it reads as unknown.
pub const STALENESS_MS: u64 = 5000;

/// Cadence of the Spotify/YouTube pollers.
pub const POLL_INTERVAL_MS: u64 = 2000;

/// Tie-break order among equally eligible sources.
pub const TIE_BREAK: [Source; Source::COUNT] = [Source::YouTube, Source::Bandcamp, Source::Spotify];

/// Source tried when nothing else applies.
pub const FALLBACK: Option<Source> = Some(Source::Spotify);

/// Bundle identifiers of native media applications.
pub const NATIVE_BUNDLE_IDS: &[&str] = &["com.spotify.client"];

/// Bundle identifiers of browsers that can host media tabs.
pub const BROWSER_BUNDLE_IDS: &[&str] = &[
    "com.google.Chrome",
    "com.google.Chrome.canary",
    "org.chromium.Chromium",
    "com.brave.Browser",
    "com.microsoft.edgemac",
    "com.apple.Safari",
];

/// AppleScript application names tried, in order, when driving browser tabs.
pub const BROWSERS: &[&str] = &["Safari", "Google Chrome", "Chromium", "Brave Browser"];

// Serde default functions
pub(crate) const fn default_enabled() -> bool {
    ENABLED
}
pub(crate) const fn default_sticky_ms() -> u64 {
    STICKY_MS
}
pub(crate) const fn default_staleness_ms() -> u64 {
    STALENESS_MS
}
pub(crate) const fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}
pub(crate) fn default_tie_break() -> Vec<Source> {
    TIE_BREAK.to_vec()
}
pub(crate) const fn default_fallback() -> Option<Source> {
    FALLBACK
}
pub(crate) fn default_native_bundle_ids() -> Vec<String> {
    NATIVE_BUNDLE_IDS.iter().map(|s| s.to_string()).collect()
}
pub(crate) fn default_browser_bundle_ids() -> Vec<String> {
    BROWSER_BUNDLE_IDS.iter().map(|s| s.to_string()).collect()
}
pub(crate) fn default_browsers() -> Vec<String> {
    BROWSERS.iter().map(|s| s.to_string()).collect()
}
