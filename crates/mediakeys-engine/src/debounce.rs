use std::time::{Duration, Instant};

use config::Policy;
use mediakeys_protocol::MediaKey;
use tracing::trace;

use crate::{DispatchHistory, FocusProbe, Reason, Resolution, Resolver, Snapshot};

/// Pins bursts of key presses to one target.
///
/// Inside the sticky window after a dispatch, the last target is reused as
/// long as it is still available, without consulting the resolver or the
/// focus probe.
#[derive(Debug, Clone)]
pub struct Debouncer {
    /// Window after a dispatch during which the target is reused.
    sticky: Duration,
    /// Resolver used outside the window.
    resolver: Resolver,
}

impl Debouncer {
    /// Debouncer for `policy`.
    pub fn new(policy: &Policy) -> Self {
        Self {
            sticky: policy.sticky(),
            resolver: Resolver::new(policy),
        }
    }

    /// Sticky window.
    pub fn sticky(&self) -> Duration {
        self.sticky
    }

    /// Resolve a key press at `now`.
    pub fn resolve(
        &self,
        now: Instant,
        snapshot: &Snapshot,
        history: &DispatchHistory,
        focus: &dyn FocusProbe,
        key: MediaKey,
    ) -> Resolution {
        if let Some(last) = history.last_target
            && let Some(elapsed) = history.since_dispatch(now)
            && elapsed < self.sticky
            && snapshot.available(last)
        {
            trace!(%last, elapsed_ms = elapsed.as_millis() as u64, "sticky_hit");
            return Resolution::to(last, Reason::Sticky);
        }
        let signal = focus.focus();
        trace!(focus = %signal, "focus_sampled");
        self.resolver.resolve(snapshot, signal, history, key)
    }
}
