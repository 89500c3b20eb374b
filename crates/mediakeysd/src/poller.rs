//! Periodic availability probes for sources that do not push their own state.
//!
//! Spotify and YouTube are polled; Bandcamp state arrives from the browser
//! extension. Probes shell out to `osascript`, so they run on the blocking
//! pool.

use std::{sync::Arc, time::Duration};

use mediakeys_engine::Engine;
use mediakeys_protocol::Source;
use tokio::{select, task, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    osascript::ScriptRunner,
    site::{self, TabReply},
    sinks::SPOTIFY_BUNDLE_ID,
};

/// One probe result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Probed source.
    pub source: Source,
    /// At least one controllable instance exists.
    pub available: bool,
    /// Audio is playing.
    pub playing: bool,
}

/// Polls Spotify and YouTube.
pub struct Poller {
    /// Script executor.
    runner: Arc<dyn ScriptRunner>,
    /// Browsers searched for YouTube tabs.
    browsers: Vec<String>,
    /// Whether an application with the given bundle id is running.
    is_running: fn(&str) -> bool,
}

impl Poller {
    /// Poller using the system's running-application list.
    pub fn new(runner: Arc<dyn ScriptRunner>, browsers: Vec<String>) -> Self {
        Self::with_running_check(runner, browsers, mac_focus::is_running)
    }

    /// Poller with a custom running-application check.
    pub fn with_running_check(
        runner: Arc<dyn ScriptRunner>,
        browsers: Vec<String>,
        is_running: fn(&str) -> bool,
    ) -> Self {
        Self {
            runner,
            browsers,
            is_running,
        }
    }

    /// Spotify: available when running, playing when its player says so.
    pub fn probe_spotify(&self) -> Probe {
        let mut probe = Probe {
            source: Source::Spotify,
            available: false,
            playing: false,
        };
        if !(self.is_running)(SPOTIFY_BUNDLE_ID) {
            return probe;
        }
        probe.available = true;
        let script = "if application \"Spotify\" is running then\n\
                      \ttell application \"Spotify\" to return player state as string\n\
                      end if\n\
                      return \"stopped\"";
        match self.runner.run(script) {
            Ok(state) => probe.playing = state == "playing",
            Err(e) => debug!(error = %e, "spotify_state_query_failed"),
        }
        probe
    }

    /// YouTube: available when any browser has a watch tab, playing when one
    /// of those tabs reports an unpaused video.
    pub fn probe_youtube(&self) -> Probe {
        let mut probe = Probe {
            source: Source::YouTube,
            available: false,
            playing: false,
        };
        let Some(js) = site::YOUTUBE.state_js() else {
            return probe;
        };
        for browser in &self.browsers {
            match self.runner.run(&site::YOUTUBE.tab_script(browser, js)) {
                Ok(out) => match TabReply::parse(&out) {
                    TabReply::NotRunning | TabReply::NoTab => {}
                    TabReply::Ran(state) => {
                        probe.available = true;
                        if state == "playing" {
                            probe.playing = true;
                            break;
                        }
                    }
                },
                Err(e) => trace!(%browser, error = %e, "youtube_probe_failed"),
            }
        }
        probe
    }

    /// Run every probe once.
    pub fn poll_once(&self) -> [Probe; 2] {
        [self.probe_spotify(), self.probe_youtube()]
    }

    /// Poll every `interval` until `cancel` fires, pushing results into
    /// `engine`.
    pub async fn run(
        self: Arc<Self>,
        engine: Engine,
        interval: Duration,
        cancel: CancellationToken,
    ) {
        let mut tick = time::interval(interval);
        tick.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        debug!(interval_ms = interval.as_millis() as u64, "poller_started");
        loop {
            select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let this = self.clone();
                    match task::spawn_blocking(move || this.poll_once()).await {
                        Ok(probes) => {
                            for p in probes {
                                engine.observe(p.source, p.available, p.playing);
                            }
                        }
                        Err(e) => warn!(error = %e, "poll_task_failed"),
                    }
                }
            }
        }
        debug!("poller_stopped");
    }
}
