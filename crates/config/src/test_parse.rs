use std::time::Duration;

use mediakeys_protocol::Source;

use crate::*;

#[test]
fn empty_document_yields_defaults() {
    let s = load_from_str("()", None).unwrap();
    assert_eq!(s, Settings::default());
    assert!(s.enabled);
    assert_eq!(s.policy.sticky(), Duration::from_secs(1));
    assert_eq!(s.policy.staleness(), Duration::from_secs(5));
    assert_eq!(
        s.policy.tie_break,
        vec![Source::YouTube, Source::Bandcamp, Source::Spotify]
    );
    assert_eq!(s.policy.fallback, Some(Source::Spotify));
}

#[test]
fn partial_policy_keeps_other_defaults() {
    let s = load_from_str(
        r#"(
            enabled: false,
            policy: (sticky_ms: 250, fallback: bandcamp),
        )"#,
        None,
    )
    .unwrap();
    assert!(!s.enabled);
    assert_eq!(s.policy.sticky_ms, 250);
    assert_eq!(s.policy.staleness_ms, defaults::STALENESS_MS);
    assert_eq!(s.policy.fallback, Some(Source::Bandcamp));
}

#[test]
fn explicit_none_disables_fallback() {
    let s = load_from_str("(policy: (fallback: None))", None).unwrap();
    assert_eq!(s.policy.fallback, None);
}

#[test]
fn tie_break_must_be_a_permutation() {
    let err = load_from_str("(policy: (tie_break: [spotify, spotify, youtube]))", None)
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert!(err.to_string().contains("more than once"));

    let err = load_from_str("(policy: (tie_break: [spotify, youtube]))", None).unwrap_err();
    assert!(err.to_string().contains("missing bandcamp"));
}

#[test]
fn zero_staleness_rejected() {
    let err = load_from_str("(policy: (staleness_ms: 0))", None).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn zero_sticky_disables_the_window() {
    let s = load_from_str("(policy: (sticky_ms: 0))", None).unwrap();
    assert_eq!(s.policy.sticky(), Duration::ZERO);
}

#[test]
fn unknown_field_is_a_parse_error() {
    let err = load_from_str("(volume: 11)", None).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
    assert!(err.pretty().starts_with("Config parse error"));
}

#[test]
fn unknown_source_is_a_parse_error() {
    let err = load_from_str("(policy: (fallback: tidal))", None).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn save_then_load_preserves_toggle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.ron");

    assert_eq!(load_or_default(&path).unwrap(), Settings::default());

    let mut s = Settings::default();
    s.enabled = false;
    s.policy.sticky_ms = 400;
    save_to_path(&s, &path).unwrap();

    let back = load_from_path(&path).unwrap();
    assert_eq!(back, s);
    assert!(!path.with_file_name("config.ron.tmp").exists());
}

#[test]
fn read_error_mentions_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_from_path(&dir.path().join("absent.ron")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(err.pretty().contains("absent.ron"));
}

#[test]
fn explicit_path_wins() {
    let p = std::path::Path::new("/tmp/explicit.ron");
    assert_eq!(resolve_config_path(Some(p)), p.to_path_buf());
}

#[test]
fn socket_defaults_under_state_dir() {
    let s = Settings::default();
    assert!(s.socket_path().ends_with(".mediakeys/mediakeyd.sock"));
}
