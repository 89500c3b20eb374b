//! Browser-hosted media sites: how to find their tabs and what JavaScript
//! drives them.

use mediakeys_protocol::{Command, Source};

use crate::osascript::quote;

/// Returned by a tab script when no matching tab exists in that browser.
pub const NO_TAB: &str = "mediakeys:no-tab";

/// Returned by the AppleScript wrapper when the browser is not running.
pub const NOT_RUNNING: &str = "mediakeys:not-running";

/// A media site driven by injecting JavaScript into one of its tabs.
#[derive(Debug)]
pub struct Site {
    /// Source the site backs.
    pub source: Source,
    /// Substring that identifies a matching tab URL.
    pub url_match: &'static str,
    /// Toggle playback.
    play_pause: &'static str,
    /// Skip forward.
    next: &'static str,
    /// Skip back or restart.
    previous: &'static str,
    /// Report `playing` or `paused`, if the site supports polling.
    state: Option<&'static str>,
}

/// youtube.com watch pages.
pub const YOUTUBE: Site = Site {
    source: Source::YouTube,
    url_match: "youtube.com/watch",
    play_pause: "(function() { \
        var btn = document.querySelector('.ytp-play-button'); \
        if (btn) { btn.click(); return 'dispatched'; } \
        return 'no controls'; })();",
    next: "(function() { \
        var btn = document.querySelector('.ytp-next-button'); \
        if (btn && btn.offsetParent !== null) { btn.click(); return 'dispatched'; } \
        return 'no controls'; })();",
    previous: "(function() { \
        var btn = document.querySelector('.ytp-prev-button'); \
        if (btn && btn.offsetParent !== null) { btn.click(); return 'dispatched'; } \
        var v = document.querySelector('video'); \
        if (v) { v.currentTime = 0; return 'dispatched restart'; } \
        return 'no controls'; })();",
    state: Some(
        "(function() { \
        var v = document.querySelector('video'); \
        if (!v) { return 'no video'; } \
        return v.paused ? 'paused' : 'playing'; })();",
    ),
};

/// bandcamp.com album and track pages. The player ignores synthetic
/// `click()` calls, so a full `MouseEvent` is dispatched.
pub const BANDCAMP: Site = Site {
    source: Source::Bandcamp,
    url_match: "bandcamp.com",
    play_pause: "(function() { \
        var btn = document.querySelector('.playbutton'); \
        if (btn) { \
            btn.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window })); \
            return 'dispatched'; } \
        return 'no controls'; })();",
    next: "(function() { \
        var btn = document.querySelector('.nextbutton'); \
        if (btn && !btn.classList.contains('hiddenelem')) { \
            btn.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window })); \
            return 'dispatched'; } \
        return 'no controls'; })();",
    previous: "(function() { \
        var btn = document.querySelector('.prevbutton'); \
        if (btn && !btn.classList.contains('hiddenelem')) { \
            btn.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window })); \
            return 'dispatched'; } \
        var bar = document.querySelector('.progbar_empty'); \
        if (bar) { \
            var r = bar.getBoundingClientRect(); \
            bar.dispatchEvent(new MouseEvent('click', { view: window, bubbles: true, cancelable: true, \
                clientX: r.left + 5, clientY: r.top + 5 })); \
            return 'dispatched restart'; } \
        return 'no controls'; })();",
    state: None,
};

/// Outcome of running a tab script in one browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabReply {
    /// The browser is not running.
    NotRunning,
    /// No tab matched.
    NoTab,
    /// The snippet ran; this is what it returned.
    Ran(String),
}

impl TabReply {
    /// Classify raw osascript output.
    pub fn parse(out: &str) -> Self {
        match out.trim() {
            NOT_RUNNING => Self::NotRunning,
            NO_TAB => Self::NoTab,
            other => Self::Ran(other.to_string()),
        }
    }

    /// True when a snippet reported that it pressed something.
    pub fn dispatched(&self) -> bool {
        matches!(self, Self::Ran(s) if s.starts_with("dispatched"))
    }
}

impl Site {
    /// Snippet implementing `command`.
    pub fn js(&self, command: Command) -> &'static str {
        match command {
            Command::TogglePlayPause => self.play_pause,
            Command::SkipForward => self.next,
            Command::SkipBackward => self.previous,
        }
    }

    /// Playback state snippet.
    pub fn state_js(&self) -> Option<&'static str> {
        self.state
    }

    /// AppleScript that runs `js` in the first tab of `browser` whose URL
    /// matches this site.
    ///
    /// The browser is never launched: the script checks it is running first.
    /// Safari uses `do JavaScript`; every other browser is assumed to speak
    /// the Chromium dictionary.
    pub fn tab_script(&self, browser: &str, js: &str) -> String {
        let app = quote(browser);
        let run = if browser == "Safari" {
            format!("do JavaScript {} in t", quote(js))
        } else {
            format!("execute t javascript {}", quote(js))
        };
        format!(
            "if application {app} is running then\n\
             \ttell application {app}\n\
             \t\trepeat with w in windows\n\
             \t\t\trepeat with t in tabs of w\n\
             \t\t\t\tif URL of t contains {url} then\n\
             \t\t\t\t\treturn ({run}) as text\n\
             \t\t\t\tend if\n\
             \t\t\tend repeat\n\
             \t\tend repeat\n\
             \tend tell\n\
             \treturn {no_tab}\n\
             end if\n\
             return {not_running}",
            url = quote(self.url_match),
            no_tab = quote(NO_TAB),
            not_running = quote(NOT_RUNNING),
        )
    }
}
