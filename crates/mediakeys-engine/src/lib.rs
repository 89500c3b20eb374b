//! mediakeys engine
//!
//! Decides which media source a key press goes to and hands the command off
//! for delivery:
//! - [`ObservationStore`]: last-known availability/playing state per source,
//!   with staleness applied on read
//! - [`Resolver`]: pure, priority-ordered target selection
//! - [`Debouncer`]: sticky window that pins key bursts to one target
//! - [`Dispatcher`]: worker thread that runs [`CommandSink`]s off the key path
//!
//! [`Engine`] ties them together. Its key path is synchronous, in-memory and
//! never fails, so it can run inside the OS event tap callback.
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use config::Policy;
use mediakeys_protocol::{Command, MediaKey, Source, SourceStatus, StatusReport};
use parking_lot::Mutex;
use tracing::{debug, info};

mod debounce;
mod dispatch;
mod error;
mod focus;
mod history;
mod resolver;
mod sink;
mod store;
pub mod test_support;

pub use debounce::Debouncer;
pub use dispatch::{Dispatcher, apply_outcome};
pub use error::{Error, Result};
pub use focus::{FocusProbe, FocusSignal, SystemFocus};
pub use history::DispatchHistory;
pub use resolver::{Reason, Resolution, Resolver};
pub use sink::{CommandSink, SinkOutcome, SinkSet};
pub use store::{Observation, ObservationStore, Snapshot, SourceState};

/// Engine state shared by every clone.
struct Inner {
    /// Capture switch; shared with the key tap.
    enabled: Arc<AtomicBool>,
    /// Observation store.
    store: Arc<ObservationStore>,
    /// Dispatch history.
    history: Arc<Mutex<DispatchHistory>>,
    /// Sticky window + resolver.
    debouncer: Debouncer,
    /// Live focus query.
    focus: Arc<dyn FocusProbe>,
    /// Worker that runs sinks.
    dispatcher: Dispatcher,
}

/// Media key routing engine.
///
/// Construct with [`Engine::new`], feed observations with
/// [`Engine::observe`] and key presses with [`Engine::handle_key`].
#[derive(Clone)]
pub struct Engine {
    /// Shared state.
    inner: Arc<Inner>,
}

impl Engine {
    /// Create an engine and start its dispatch worker.
    pub fn new(
        policy: &Policy,
        enabled: bool,
        focus: Arc<dyn FocusProbe>,
        sinks: SinkSet,
    ) -> Result<Self> {
        policy.validate().map_err(Error::Policy)?;
        let store = Arc::new(ObservationStore::new(policy.staleness()));
        let history = Arc::new(Mutex::new(DispatchHistory::default()));
        let dispatcher = Dispatcher::spawn(sinks, store.clone(), history.clone())?;
        debug!(
            sticky_ms = policy.sticky_ms,
            staleness_ms = policy.staleness_ms,
            tie_break = ?policy.tie_break,
            fallback = ?policy.fallback,
            enabled,
            "engine_created"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                enabled: Arc::new(AtomicBool::new(enabled)),
                store,
                history,
                debouncer: Debouncer::new(policy),
                focus,
                dispatcher,
            }),
        })
    }

    /// The capture switch, for sharing with the key tap.
    pub fn enabled_flag(&self) -> Arc<AtomicBool> {
        self.inner.enabled.clone()
    }

    /// Whether key capture is on.
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Set the capture switch; returns the previous value.
    pub fn set_enabled(&self, on: bool) -> bool {
        let prev = self.inner.enabled.swap(on, Ordering::SeqCst);
        if prev != on {
            info!(enabled = on, "capture_switched");
        }
        prev
    }

    /// Handle a key press now.
    pub fn handle_key(&self, key: MediaKey) -> Resolution {
        self.handle_key_at(key, Instant::now())
    }

    /// Handle a key press at `now`: resolve, record and enqueue.
    ///
    /// Returns immediately; delivery happens on the dispatch worker.
    pub fn handle_key_at(&self, key: MediaKey, now: Instant) -> Resolution {
        if !self.is_enabled() {
            return Resolution::none(Reason::Disabled);
        }
        let snapshot = self.inner.store.snapshot(now);
        let resolution = {
            let mut history = self.inner.history.lock();
            let r = self.inner.debouncer.resolve(
                now,
                &snapshot,
                &history,
                self.inner.focus.as_ref(),
                key,
            );
            if let Some(target) = r.target {
                history.record_dispatch(target, now);
            }
            r
        };
        match resolution.target {
            Some(target) => {
                let command = Command::from(key);
                info!(%key, %target, reason = %resolution.reason, %command, "key_dispatched");
                self.inner.dispatcher.dispatch(target, command);
            }
            None => {
                info!(%key, reason = %resolution.reason, "key_swallowed");
            }
        }
        resolution
    }

    /// Push an observation stamped now.
    pub fn observe(&self, source: Source, available: bool, playing: bool) {
        self.inner.store.update(source, available, playing);
    }

    /// Push an observation stamped `at`.
    pub fn observe_at(&self, source: Source, available: bool, playing: bool, at: Instant) {
        self.inner.store.update_at(source, available, playing, at);
    }

    /// Out-of-band command result (from the browser extension).
    pub fn confirm(&self, source: Source, success: bool, message: Option<&str>) {
        self.confirm_at(source, success, message, Instant::now());
    }

    /// Out-of-band command result at `at`.
    pub fn confirm_at(&self, source: Source, success: bool, message: Option<&str>, at: Instant) {
        let outcome = if success {
            SinkOutcome::Delivered
        } else {
            SinkOutcome::Failed(message.unwrap_or("extension reported failure").to_string())
        };
        apply_outcome(&self.inner.store, &self.inner.history, source, &outcome, at);
    }

    /// Staleness-filtered view at `now`.
    pub fn snapshot_at(&self, now: Instant) -> Snapshot {
        self.inner.store.snapshot(now)
    }

    /// Copy of the dispatch history.
    pub fn history(&self) -> DispatchHistory {
        *self.inner.history.lock()
    }

    /// Status report at `now`. `hosts` is left at zero for the caller.
    pub fn status_at(&self, now: Instant) -> StatusReport {
        let snap = self.inner.store.snapshot(now);
        let history = self.history();
        StatusReport {
            enabled: self.is_enabled(),
            sources: Source::ALL
                .into_iter()
                .map(|source| {
                    let st = snap.get(source);
                    SourceStatus {
                        source,
                        available: st.available,
                        playing: st.playing,
                        age_ms: st.age.map(|a| a.as_millis() as u64),
                    }
                })
                .collect(),
            last_target: history.last_target,
            last_dispatch_ms_ago: history.since_dispatch(now).map(|d| d.as_millis() as u64),
            last_success_ms_ago: history.since_success(now).map(|d| d.as_millis() as u64),
            hosts: 0,
        }
    }

    /// Status report now.
    pub fn status(&self) -> StatusReport {
        self.status_at(Instant::now())
    }

    /// Block until every dispatched command has been handled by its sink.
    pub fn sync(&self) {
        self.inner.dispatcher.sync();
    }
}
