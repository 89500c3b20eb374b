//! Fire-and-forget command dispatch.
//!
//! The key path only enqueues; a dedicated worker thread runs the sink and
//! folds its outcome back into the observation store and history.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use mediakeys_protocol::{Command, Source};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::{DispatchHistory, ObservationStore, Result, SinkOutcome, SinkSet};

/// Work for the dispatch thread.
enum Job {
    /// Run a command against a source.
    Send {
        /// Target.
        source: Source,
        /// What to do.
        command: Command,
    },
    /// Acknowledge once every earlier job is done.
    Barrier(Sender<()>),
}

/// Handle to the dispatch worker. Dropping it drains the queue and joins the
/// thread.
pub struct Dispatcher {
    /// Queue into the worker.
    tx: Option<Sender<Job>>,
    /// Worker thread.
    worker: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn the worker.
    pub fn spawn(
        sinks: SinkSet,
        store: Arc<ObservationStore>,
        history: Arc<Mutex<DispatchHistory>>,
    ) -> Result<Self> {
        let (tx, rx) = unbounded();
        let worker = thread::Builder::new()
            .name("mediakeys-dispatch".into())
            .spawn(move || run(&rx, &sinks, &store, &history))?;
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Queue `command` for `source`. Never blocks.
    pub fn dispatch(&self, source: Source, command: Command) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(Job::Send { source, command }).is_err() {
            warn!(%source, %command, "dispatch_worker_gone");
        }
    }

    /// Block until every command queued so far has been handled.
    pub fn sync(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (done_tx, done_rx) = bounded(1);
        if tx.send(Job::Barrier(done_tx)).is_ok() {
            done_rx.recv().ok();
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(w) = self.worker.take() {
            w.join().ok();
        }
    }
}

/// Worker loop.
fn run(
    rx: &Receiver<Job>,
    sinks: &SinkSet,
    store: &ObservationStore,
    history: &Mutex<DispatchHistory>,
) {
    debug!("dispatch_worker_started");
    for job in rx {
        match job {
            Job::Send { source, command } => {
                let outcome = match sinks.get(source) {
                    Some(sink) => {
                        trace!(%source, %command, sink = sink.name(), "sink_send");
                        sink.send(command)
                    }
                    None => SinkOutcome::Failed("no sink installed".to_string()),
                };
                trace!(%source, %command, ?outcome, "sink_returned");
                apply_outcome(store, history, source, &outcome, Instant::now());
            }
            Job::Barrier(done) => {
                done.send(()).ok();
            }
        }
    }
    debug!("dispatch_worker_stopped");
}

/// Fold a sink result back into the store and history.
///
/// The dispatch decision itself is never revisited.
pub fn apply_outcome(
    store: &ObservationStore,
    history: &Mutex<DispatchHistory>,
    source: Source,
    outcome: &SinkOutcome,
    at: Instant,
) {
    match outcome {
        SinkOutcome::Delivered => {
            store.confirm_available_at(source, at);
            history.lock().record_success(at);
            debug!(%source, "command_delivered");
        }
        SinkOutcome::Forwarded => {
            debug!(%source, "command_forwarded");
        }
        SinkOutcome::NotFound => {
            store.update_at(source, false, false, at);
            debug!(%source, "command_target_missing");
        }
        SinkOutcome::Failed(message) => {
            warn!(%source, %message, "command_failed");
        }
    }
}
