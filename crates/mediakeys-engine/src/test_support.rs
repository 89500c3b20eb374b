//! Test support utilities for mediakeys-engine unit and integration tests.
//! These helpers are public so integration tests and the daemon's tests can
//! share them.

use std::{sync::Arc, time::Duration};

use config::Policy;
use crossbeam_channel::{Receiver, Sender, unbounded};
use mediakeys_protocol::{Command, Source};
use parking_lot::Mutex;

use crate::{CommandSink, Engine, FocusProbe, FocusSignal, SinkOutcome, SinkSet};

/// Sink that records every command and replies with a settable outcome.
pub struct RecordingSink {
    /// Name reported in logs.
    name: String,
    /// Outcome returned by the next sends.
    outcome: Mutex<SinkOutcome>,
    /// Commands received so far.
    calls: Mutex<Vec<Command>>,
    /// Notification channel, one message per send.
    tx: Sender<Command>,
    /// Receiving side of `tx`.
    rx: Receiver<Command>,
}

impl RecordingSink {
    /// New sink that reports [`SinkOutcome::Delivered`].
    pub fn new(name: &str) -> Arc<Self> {
        let (tx, rx) = unbounded();
        Arc::new(Self {
            name: name.to_string(),
            outcome: Mutex::new(SinkOutcome::Delivered),
            calls: Mutex::new(Vec::new()),
            tx,
            rx,
        })
    }

    /// Change the outcome of subsequent sends.
    pub fn set_outcome(&self, outcome: SinkOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Commands received so far.
    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().clone()
    }

    /// Wait up to `timeout` for the next command.
    pub fn next_call(&self, timeout: Duration) -> Option<Command> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl CommandSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, command: Command) -> SinkOutcome {
        self.calls.lock().push(command);
        self.tx.send(command).ok();
        self.outcome.lock().clone()
    }
}

/// Focus probe returning a settable value.
#[derive(Debug, Default)]
pub struct FixedFocus {
    /// Current value.
    signal: Mutex<FocusSignal>,
}

impl FixedFocus {
    /// Probe reporting `signal`.
    pub fn new(signal: FocusSignal) -> Arc<Self> {
        Arc::new(Self {
            signal: Mutex::new(signal),
        })
    }

    /// Change the reported value.
    pub fn set(&self, signal: FocusSignal) {
        *self.signal.lock() = signal;
    }
}

impl FocusProbe for FixedFocus {
    fn focus(&self) -> FocusSignal {
        *self.signal.lock()
    }
}

/// An engine wired to recording sinks and a fixed focus probe.
pub struct Harness {
    /// Engine under test.
    pub engine: Engine,
    /// Focus probe driving the engine.
    pub focus: Arc<FixedFocus>,
    /// One sink per source, indexed by [`Source::index`].
    pub sinks: [Arc<RecordingSink>; Source::COUNT],
}

impl Harness {
    /// Harness using `policy`, enabled, with focus on neither family.
    pub fn new(policy: &Policy) -> Self {
        let focus = FixedFocus::new(FocusSignal::Neither);
        let sinks = Source::ALL.map(|s| RecordingSink::new(s.as_str()));
        let set = Source::ALL
            .into_iter()
            .fold(SinkSet::new(), |set, s| {
                set.with(s, sinks[s.index()].clone() as Arc<dyn CommandSink>)
            });
        let engine = Engine::new(policy, true, focus.clone(), set)
            .unwrap_or_else(|e| panic!("engine construction failed: {e}"));
        Self {
            engine,
            focus,
            sinks,
        }
    }

    /// Sink for `source`.
    pub fn sink(&self, source: Source) -> &RecordingSink {
        &self.sinks[source.index()]
    }

    /// Commands delivered to `source` once the dispatch queue has drained.
    pub fn delivered(&self, source: Source) -> Vec<Command> {
        self.engine.sync();
        self.sink(source).calls()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(&Policy::default())
    }
}
