//! Last-known state of every source.
//!
//! Each source has its own slot behind its own lock, so pushes for different
//! sources never contend and a reader never sees a half-written record.
//! Staleness is applied in exactly one place, [`ObservationStore::snapshot`];
//! everything downstream works on "fresh or false" data.

use std::time::{Duration, Instant};

use mediakeys_protocol::Source;
use parking_lot::RwLock;
use tracing::{debug, trace};

/// One pushed observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// At least one controllable instance exists.
    pub available: bool,
    /// Actively producing audio.
    pub playing: bool,
    /// When the observation was recorded.
    pub observed_at: Instant,
}

/// Staleness-filtered view of one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceState {
    /// Available, or `false` when stale or never observed.
    pub available: bool,
    /// Playing, or `false` when stale or never observed.
    pub playing: bool,
    /// Age of the underlying observation, fresh or not.
    pub age: Option<Duration>,
}

/// Point-in-time view of every source with staleness applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Indexed by [`Source::index`].
    states: [SourceState; Source::COUNT],
}

impl Snapshot {
    /// Snapshot in which nothing is known.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder used by tests and by callers that assemble state by hand.
    #[must_use]
    pub fn with(mut self, source: Source, available: bool, playing: bool) -> Self {
        self.states[source.index()] = SourceState {
            available,
            playing,
            age: Some(Duration::ZERO),
        };
        self
    }

    /// State of `source`.
    pub fn get(&self, source: Source) -> SourceState {
        self.states[source.index()]
    }

    /// Whether `source` is available.
    pub fn available(&self, source: Source) -> bool {
        self.get(source).available
    }

    /// Whether `source` is playing.
    pub fn playing(&self, source: Source) -> bool {
        self.get(source).playing
    }

    /// Sources currently playing, in declaration order.
    pub fn playing_sources(&self) -> impl Iterator<Item = Source> + '_ {
        Source::ALL.into_iter().filter(|s| self.playing(*s))
    }

    /// Number of sources currently playing.
    pub fn playing_count(&self) -> usize {
        self.playing_sources().count()
    }
}

/// Process-wide observation store.
#[derive(Debug)]
pub struct ObservationStore {
    /// One independently replaceable record per source.
    slots: [RwLock<Option<Observation>>; Source::COUNT],
    /// Maximum age before an observation reads as unknown.
    staleness: Duration,
}

impl ObservationStore {
    /// Empty store; every source starts unknown.
    pub fn new(staleness: Duration) -> Self {
        Self {
            slots: Default::default(),
            staleness,
        }
    }

    /// Overwrite the observation for `source`, stamped now.
    pub fn update(&self, source: Source, available: bool, playing: bool) {
        self.update_at(source, available, playing, Instant::now());
    }

    /// Overwrite the observation for `source`, stamped `at`.
    pub fn update_at(&self, source: Source, available: bool, playing: bool, at: Instant) {
        let obs = Observation {
            available,
            playing,
            observed_at: at,
        };
        let prev = self.slots[source.index()].write().replace(obs);
        let changed = prev.is_none_or(|p| p.available != available || p.playing != playing);
        if changed {
            debug!(%source, available, playing, "observation_changed");
        } else {
            trace!(%source, available, playing, "observation_refreshed");
        }
    }

    /// Record that a command reached `source`: it is available. Delivery
    /// says nothing about playback, so `playing` is cleared rather than
    /// carried forward under a fresh timestamp.
    pub fn confirm_available_at(&self, source: Source, at: Instant) {
        self.update_at(source, true, false, at);
    }

    /// Raw record for `source`, without staleness applied.
    pub fn raw(&self, source: Source) -> Option<Observation> {
        *self.slots[source.index()].read()
    }

    /// Staleness-filtered view of every source at `now`.
    ///
    /// An observation aged `staleness` or more reads as unavailable and not
    /// playing, whatever was last pushed.
    pub fn snapshot(&self, now: Instant) -> Snapshot {
        let mut snap = Snapshot::empty();
        for source in Source::ALL {
            if let Some(obs) = self.raw(source) {
                let fresh = !self.is_stale(&obs, now);
                snap.states[source.index()] = SourceState {
                    available: fresh && obs.available,
                    playing: fresh && obs.playing,
                    age: Some(now.saturating_duration_since(obs.observed_at)),
                };
            }
        }
        snap
    }

    /// True when `obs` is too old to trust at `now`.
    fn is_stale(&self, obs: &Observation, now: Instant) -> bool {
        now.saturating_duration_since(obs.observed_at) >= self.staleness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: Duration = Duration::from_secs(5);

    #[test]
    fn unknown_sources_read_false() {
        let store = ObservationStore::new(STALE);
        let snap = store.snapshot(Instant::now());
        for s in Source::ALL {
            assert_eq!(snap.get(s), SourceState::default());
        }
    }

    #[test]
    fn staleness_boundary_is_inclusive() {
        let store = ObservationStore::new(STALE);
        let t0 = Instant::now();
        store.update_at(Source::Spotify, true, true, t0);

        let just_before = store.snapshot(t0 + STALE - Duration::from_millis(1));
        assert!(just_before.playing(Source::Spotify));
        assert!(just_before.available(Source::Spotify));

        let at_edge = store.snapshot(t0 + STALE);
        assert!(!at_edge.playing(Source::Spotify));
        assert!(!at_edge.available(Source::Spotify));
        assert_eq!(at_edge.get(Source::Spotify).age, Some(STALE));
    }

    #[test]
    fn sources_are_independent() {
        let store = ObservationStore::new(STALE);
        let t0 = Instant::now();
        store.update_at(Source::Bandcamp, true, true, t0);
        store.update_at(Source::YouTube, true, false, t0);
        store.update_at(Source::Bandcamp, false, false, t0);
        let snap = store.snapshot(t0);
        assert!(!snap.available(Source::Bandcamp));
        assert!(snap.available(Source::YouTube));
        assert_eq!(snap.playing_count(), 0);
    }

    #[test]
    fn confirm_does_not_extend_playing() {
        let store = ObservationStore::new(STALE);
        let t0 = Instant::now();
        store.update_at(Source::Bandcamp, true, true, t0);
        store.confirm_available_at(Source::Bandcamp, t0 + Duration::from_millis(4900));

        let snap = store.snapshot(t0 + Duration::from_secs(9));
        assert!(snap.available(Source::Bandcamp));
        assert!(!snap.playing(Source::Bandcamp));
        assert_eq!(snap.playing_count(), 0);
    }

    #[test]
    fn concurrent_updates_do_not_tear() {
        use std::{sync::Arc, thread};

        let store = Arc::new(ObservationStore::new(STALE));
        let handles: Vec<_> = Source::ALL
            .into_iter()
            .map(|s| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..1000 {
                        let on = i % 2 == 0;
                        store.update(s, on, on);
                    }
                })
            })
            .collect();
        for _ in 0..1000 {
            let snap = store.snapshot(Instant::now());
            for s in Source::ALL {
                let st = snap.get(s);
                assert_eq!(st.available, st.playing, "torn record for {s}");
            }
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
