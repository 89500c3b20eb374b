//! Concrete command sinks: AppleScript for Spotify and browser tabs, and the
//! browser extension relay.

use std::sync::Arc;

use config::Settings;
use mediakeys_engine::{CommandSink, SinkOutcome, SinkSet};
use mediakeys_protocol::{Command, Msg, Source};
use tracing::debug;

use crate::{
    hosts::HostRegistry,
    osascript::ScriptRunner,
    site::{self, Site, TabReply},
};

/// Bundle identifier of the Spotify desktop client.
pub const SPOTIFY_BUNDLE_ID: &str = "com.spotify.client";

/// Returned by the Spotify scripts when the app is not running.
const SPOTIFY_NOT_RUNNING: &str = "mediakeys:not-running";

/// Drives the Spotify desktop app through its AppleScript dictionary.
pub struct SpotifySink {
    /// Script executor.
    runner: Arc<dyn ScriptRunner>,
}

impl SpotifySink {
    /// Sink using `runner`.
    pub fn new(runner: Arc<dyn ScriptRunner>) -> Self {
        Self { runner }
    }

    /// AppleScript for `command`. Spotify is never launched by a key press.
    pub fn script(command: Command) -> String {
        let verb = match command {
            Command::TogglePlayPause => "playpause",
            Command::SkipForward => "next track",
            Command::SkipBackward => "previous track",
        };
        format!(
            "if application \"Spotify\" is running then\n\
             \ttell application \"Spotify\" to {verb}\n\
             \treturn \"ok\"\n\
             end if\n\
             return \"{SPOTIFY_NOT_RUNNING}\""
        )
    }
}

impl CommandSink for SpotifySink {
    fn name(&self) -> &str {
        "spotify-applescript"
    }

    fn send(&self, command: Command) -> SinkOutcome {
        match self.runner.run(&Self::script(command)) {
            Ok(out) if out == SPOTIFY_NOT_RUNNING => SinkOutcome::NotFound,
            Ok(_) => SinkOutcome::Delivered,
            Err(e) => SinkOutcome::Failed(e),
        }
    }
}

/// Runs a site's JavaScript in the first matching tab, trying each browser
/// in order.
pub struct BrowserTabSink {
    /// Site to drive.
    site: &'static Site,
    /// AppleScript application names, in the order tried.
    browsers: Vec<String>,
    /// Script executor.
    runner: Arc<dyn ScriptRunner>,
    /// Log name.
    name: String,
}

impl BrowserTabSink {
    /// Sink for `site` trying `browsers` in order.
    pub fn new(site: &'static Site, browsers: Vec<String>, runner: Arc<dyn ScriptRunner>) -> Self {
        Self {
            site,
            browsers,
            runner,
            name: format!("{}-tab", site.source),
        }
    }
}

impl CommandSink for BrowserTabSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, command: Command) -> SinkOutcome {
        let js = self.site.js(command);
        let mut failure = None;
        for browser in &self.browsers {
            let reply = match self.runner.run(&self.site.tab_script(browser, js)) {
                Ok(out) => TabReply::parse(&out),
                Err(e) => {
                    debug!(source = %self.site.source, %browser, error = %e, "tab_script_failed");
                    continue;
                }
            };
            match reply {
                TabReply::NotRunning | TabReply::NoTab => {}
                r if r.dispatched() => {
                    debug!(
                        source = %self.site.source,
                        %browser,
                        %command,
                        "tab_command_dispatched"
                    );
                    return SinkOutcome::Delivered;
                }
                TabReply::Ran(out) => {
                    failure = Some(format!("{browser}: {out}"));
                }
            }
        }
        failure.map_or(SinkOutcome::NotFound, SinkOutcome::Failed)
    }
}

/// Forwards commands to the browser extension through connected
/// native-messaging hosts, falling back to tab scripting when none is
/// connected.
pub struct ExtensionSink {
    /// Connected hosts.
    hosts: HostRegistry,
    /// Used when no host is connected.
    fallback: BrowserTabSink,
}

impl ExtensionSink {
    /// Sink relaying through `hosts`.
    pub fn new(hosts: HostRegistry, fallback: BrowserTabSink) -> Self {
        Self { hosts, fallback }
    }
}

impl CommandSink for ExtensionSink {
    fn name(&self) -> &str {
        "extension"
    }

    fn send(&self, command: Command) -> SinkOutcome {
        let n = self.hosts.broadcast(&Msg::Action { action: command });
        if n > 0 {
            debug!(hosts = n, %command, "command_relayed_to_extension");
            return SinkOutcome::Forwarded;
        }
        debug!(%command, "no_extension_host_falling_back");
        self.fallback.send(command)
    }
}

/// The production sink set.
pub fn build_sinks(
    settings: &Settings,
    runner: &Arc<dyn ScriptRunner>,
    hosts: HostRegistry,
) -> SinkSet {
    let browsers = settings.browsers.clone();
    let bandcamp_tabs = BrowserTabSink::new(&site::BANDCAMP, browsers.clone(), runner.clone());
    SinkSet::new()
        .with(Source::Spotify, Arc::new(SpotifySink::new(runner.clone())))
        .with(
            Source::YouTube,
            Arc::new(BrowserTabSink::new(&site::YOUTUBE, browsers, runner.clone())),
        )
        .with(
            Source::Bandcamp,
            Arc::new(ExtensionSink::new(hosts, bandcamp_tabs)),
        )
}
