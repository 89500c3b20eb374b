use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use config::Policy;
use crossbeam_channel::{Receiver, Sender, unbounded};
use mediakeys_engine::{
    CommandSink, Engine, Error, FocusSignal, Reason, Resolution, SinkOutcome, SinkSet,
    test_support::{FixedFocus, Harness},
};
use mediakeys_protocol::{Command, MediaKey, Source};

const WAIT: Duration = Duration::from_secs(2);

/// Sink that holds every send until the test releases it.
struct GateSink {
    /// Announces each command as its send starts.
    entered: Sender<Command>,
    /// One message lets one send finish.
    release: Receiver<()>,
}

impl CommandSink for GateSink {
    fn name(&self) -> &str {
        "gate"
    }

    fn send(&self, command: Command) -> SinkOutcome {
        self.entered.send(command).ok();
        self.release.recv().ok();
        SinkOutcome::Delivered
    }
}

#[test]
fn idle_source_owned_by_focus_is_chosen() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::Bandcamp, true, false, t0);
    h.engine.observe_at(Source::Spotify, false, false, t0);
    h.focus.set(FocusSignal::Browser);

    let r = h.engine.handle_key_at(MediaKey::PlayPause, t0);
    assert_eq!(r, Resolution::to(Source::Bandcamp, Reason::Focus));
    assert_eq!(
        h.sink(Source::Bandcamp).next_call(WAIT),
        Some(Command::TogglePlayPause)
    );
}

#[test]
fn two_players_resolve_to_focus_owner() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::YouTube, true, true, t0);
    h.engine.observe_at(Source::Spotify, true, true, t0);
    h.focus.set(FocusSignal::Native);

    let r = h.engine.handle_key_at(MediaKey::Next, t0);
    assert_eq!(r, Resolution::to(Source::Spotify, Reason::ContentionFocus));
    assert_eq!(h.delivered(Source::Spotify), vec![Command::SkipForward]);
    assert!(h.delivered(Source::YouTube).is_empty());
}

#[test]
fn unavailable_fallback_yields_no_target() {
    let policy = Policy {
        fallback: Some(Source::Bandcamp),
        ..Policy::default()
    };
    let h = Harness::new(&policy);
    let t0 = Instant::now();
    h.engine.observe_at(Source::Bandcamp, false, false, t0);
    h.engine.observe_at(Source::Spotify, false, false, t0);

    let r = h.engine.handle_key_at(MediaKey::PlayPause, t0);
    assert_eq!(r, Resolution::none(Reason::NoTarget));
    assert_eq!(h.engine.history().last_target, None);
    for s in Source::ALL {
        assert!(h.delivered(s).is_empty());
    }
}

#[test]
fn burst_of_next_presses_sticks() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::YouTube, true, true, t0);
    h.engine.observe_at(Source::Spotify, true, false, t0);

    let first = h.engine.handle_key_at(MediaKey::Next, t0);
    assert_eq!(first, Resolution::to(Source::YouTube, Reason::Exclusive));

    let second = h
        .engine
        .handle_key_at(MediaKey::Next, t0 + Duration::from_millis(200));
    assert_eq!(second, Resolution::to(Source::YouTube, Reason::Sticky));
    assert_eq!(
        h.delivered(Source::YouTube),
        vec![Command::SkipForward, Command::SkipForward]
    );
}

#[test]
fn sticky_survives_a_contrary_observation() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::Bandcamp, true, true, t0);
    assert_eq!(
        h.engine.handle_key_at(MediaKey::PlayPause, t0).target,
        Some(Source::Bandcamp)
    );
    h.engine.sync();

    h.engine
        .observe_at(Source::Bandcamp, true, false, t0 + Duration::from_millis(400));
    h.engine
        .observe_at(Source::Spotify, true, true, t0 + Duration::from_millis(400));

    let r = h
        .engine
        .handle_key_at(MediaKey::PlayPause, t0 + Duration::from_millis(500));
    assert_eq!(r, Resolution::to(Source::Bandcamp, Reason::Sticky));

    let later = h
        .engine
        .handle_key_at(MediaKey::PlayPause, t0 + Duration::from_millis(1600));
    assert_eq!(later, Resolution::to(Source::Spotify, Reason::Exclusive));
}

#[test]
fn stale_observation_reads_unknown() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::YouTube, true, true, t0);
    let snap = h.engine.snapshot_at(t0 + Duration::from_secs(5));
    assert!(!snap.playing(Source::YouTube));
    assert!(!snap.available(Source::YouTube));

    let r = h
        .engine
        .handle_key_at(MediaKey::PlayPause, t0 + Duration::from_secs(5));
    assert_eq!(r, Resolution::none(Reason::NoTarget));
}

#[test]
fn disabled_engine_does_nothing() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::Spotify, true, true, t0);
    assert!(h.engine.set_enabled(false));

    let r = h.engine.handle_key_at(MediaKey::PlayPause, t0);
    assert_eq!(r, Resolution::none(Reason::Disabled));
    assert!(h.delivered(Source::Spotify).is_empty());
    assert!(!h.engine.set_enabled(true));
}

#[test]
fn not_found_marks_source_unavailable() {
    let h = Harness::default();
    h.sink(Source::YouTube).set_outcome(SinkOutcome::NotFound);
    let now = Instant::now();
    h.engine.observe_at(Source::YouTube, true, true, now);

    h.engine.handle_key_at(MediaKey::PlayPause, now);
    h.engine.sync();

    let snap = h.engine.snapshot_at(Instant::now());
    assert!(!snap.available(Source::YouTube));
    assert_eq!(h.engine.history().last_target, Some(Source::YouTube));
    assert_eq!(h.engine.history().last_confirmed_success_at, None);
}

#[test]
fn delivery_stamps_success() {
    let h = Harness::default();
    let now = Instant::now();
    h.engine.observe_at(Source::Spotify, true, false, now);

    let r = h.engine.handle_key_at(MediaKey::Previous, now);
    assert_eq!(r, Resolution::to(Source::Spotify, Reason::Fallback));
    assert_eq!(h.delivered(Source::Spotify), vec![Command::SkipBackward]);
    assert!(h.engine.history().last_confirmed_success_at.is_some());
    assert!(h.engine.snapshot_at(Instant::now()).available(Source::Spotify));
}

#[test]
fn confirmation_does_not_revive_a_stale_player() {
    let h = Harness::default();
    let t0 = Instant::now();
    h.engine.observe_at(Source::Bandcamp, true, true, t0);
    h.engine
        .confirm_at(Source::Bandcamp, true, None, t0 + Duration::from_millis(4900));

    let t9 = t0 + Duration::from_secs(9);
    h.engine.observe_at(Source::Spotify, true, false, t9);
    assert!(!h.engine.snapshot_at(t9).playing(Source::Bandcamp));

    let r = h.engine.handle_key_at(MediaKey::PlayPause, t9);
    assert_eq!(r, Resolution::to(Source::Spotify, Reason::Fallback));
}

#[test]
fn blocked_sink_does_not_hold_up_key_presses() {
    let (entered_tx, entered) = unbounded();
    let (release, release_rx) = unbounded();
    let gate = Arc::new(GateSink {
        entered: entered_tx,
        release: release_rx,
    });
    let engine = Engine::new(
        &Policy::default(),
        true,
        FixedFocus::new(FocusSignal::Neither),
        SinkSet::new().with(Source::YouTube, gate),
    )
    .unwrap();
    let t0 = Instant::now();
    engine.observe_at(Source::YouTube, true, true, t0);

    let first = engine.handle_key_at(MediaKey::Next, t0);
    assert_eq!(first, Resolution::to(Source::YouTube, Reason::Exclusive));
    assert_eq!(entered.recv_timeout(WAIT), Ok(Command::SkipForward));

    // The first send is parked in the sink; the key path still answers.
    let second = engine.handle_key_at(
        MediaKey::PlayPause,
        t0 + Duration::from_millis(200),
    );
    assert_eq!(second, Resolution::to(Source::YouTube, Reason::Sticky));
    assert_eq!(engine.history().last_confirmed_success_at, None);

    release.send(()).unwrap();
    assert_eq!(entered.recv_timeout(WAIT), Ok(Command::TogglePlayPause));
    release.send(()).unwrap();
    engine.sync();
    assert!(engine.history().last_confirmed_success_at.is_some());
}

#[test]
fn failure_changes_nothing() {
    let h = Harness::default();
    h.sink(Source::Spotify)
        .set_outcome(SinkOutcome::Failed("osascript exited 1".into()));
    let now = Instant::now();
    h.engine.observe_at(Source::Spotify, true, true, now);

    h.engine.handle_key_at(MediaKey::PlayPause, now);
    h.engine.sync();

    let snap = h.engine.snapshot_at(now);
    assert!(snap.playing(Source::Spotify));
    assert_eq!(h.engine.history().last_confirmed_success_at, None);
}

#[test]
fn extension_confirmation_marks_available() {
    let h = Harness::default();
    let now = Instant::now();
    h.engine.confirm_at(Source::Bandcamp, true, None, now);
    assert!(h.engine.snapshot_at(now).available(Source::Bandcamp));
    assert!(h.engine.history().last_confirmed_success_at.is_some());

    h.engine
        .confirm_at(Source::YouTube, false, Some("no tabs"), now);
    assert!(!h.engine.snapshot_at(now).available(Source::YouTube));
}

#[test]
fn status_reports_every_source() {
    let h = Harness::default();
    // Leave the store untouched by the delivery so ages are exact.
    h.sink(Source::Spotify).set_outcome(SinkOutcome::Forwarded);
    let t0 = Instant::now();
    h.engine.observe_at(Source::Spotify, true, true, t0);
    h.engine.handle_key_at(MediaKey::PlayPause, t0);
    h.engine.sync();

    let report = h.engine.status_at(t0 + Duration::from_millis(250));
    assert!(report.enabled);
    assert_eq!(report.sources.len(), Source::COUNT);
    let spotify = report
        .sources
        .iter()
        .find(|s| s.source == Source::Spotify)
        .unwrap();
    assert!(spotify.playing);
    assert_eq!(spotify.age_ms, Some(250));
    assert_eq!(report.last_target, Some(Source::Spotify));
    assert_eq!(report.last_dispatch_ms_ago, Some(250));
    let bandcamp = report
        .sources
        .iter()
        .find(|s| s.source == Source::Bandcamp)
        .unwrap();
    assert_eq!(bandcamp.age_ms, None);
}

#[test]
fn invalid_policy_is_rejected() {
    let policy = Policy {
        tie_break: vec![Source::Spotify, Source::Spotify],
        ..Policy::default()
    };
    let focus = FixedFocus::new(FocusSignal::Neither);
    let err = Engine::new(&policy, true, focus, SinkSet::new())
        .err()
        .unwrap();
    assert!(matches!(err, Error::Policy(_)));
}
