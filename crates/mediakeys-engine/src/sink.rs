//! Command sinks: the things that actually drive a source.

use std::{fmt, sync::Arc};

use mediakeys_protocol::{Command, Source};

/// Result of handing a command to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    /// The command reached a live instance of the source.
    Delivered,
    /// The command was handed to another process; its result arrives later
    /// through [`crate::Engine::confirm`].
    Forwarded,
    /// No controllable instance of the source exists.
    NotFound,
    /// Something went wrong; the message is logged.
    Failed(String),
}

/// Executes transport commands against one source.
///
/// Sinks run on the dispatch worker thread and may block.
pub trait CommandSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Execute `command`.
    fn send(&self, command: Command) -> SinkOutcome;
}

/// One optional sink per source.
#[derive(Clone, Default)]
pub struct SinkSet {
    /// Indexed by [`Source::index`].
    sinks: [Option<Arc<dyn CommandSink>>; Source::COUNT],
}

impl SinkSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `sink` for `source`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, source: Source, sink: Arc<dyn CommandSink>) -> Self {
        self.sinks[source.index()] = Some(sink);
        self
    }

    /// Sink for `source`, if one is installed.
    pub fn get(&self, source: Source) -> Option<&Arc<dyn CommandSink>> {
        self.sinks[source.index()].as_ref()
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for s in Source::ALL {
            m.entry(&s.as_str(), &self.get(s).map(|k| k.name().to_string()));
        }
        m.finish()
    }
}
