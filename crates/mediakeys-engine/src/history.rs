use std::time::{Duration, Instant};

use mediakeys_protocol::Source;

/// What the engine last dispatched and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchHistory {
    /// Most recent dispatch target.
    pub last_target: Option<Source>,
    /// When that dispatch was issued.
    pub last_dispatch_at: Option<Instant>,
    /// When a sink last confirmed a delivery.
    pub last_confirmed_success_at: Option<Instant>,
}

impl DispatchHistory {
    /// Record a dispatch optimistically, before any confirmation.
    pub fn record_dispatch(&mut self, target: Source, at: Instant) {
        self.last_target = Some(target);
        self.last_dispatch_at = Some(at);
    }

    /// Record a confirmed delivery.
    pub fn record_success(&mut self, at: Instant) {
        self.last_confirmed_success_at = Some(at);
    }

    /// Time since the last dispatch, if there was one.
    pub fn since_dispatch(&self, now: Instant) -> Option<Duration> {
        self.last_dispatch_at.map(|t| now.saturating_duration_since(t))
    }

    /// Time since the last confirmed delivery, if there was one.
    pub fn since_success(&self, now: Instant) -> Option<Duration> {
        self.last_confirmed_success_at.map(|t| now.saturating_duration_since(t))
    }
}
