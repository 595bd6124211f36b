use std::{fs, path::Path};

use crate::{Error, load_from_path, load_from_str, resolve_config_path};

const FULL: &str = r#"(
    port: "/dev/tty.usbmodem1421",
    tracking: (base_url: "https://track.example.net/api", token: "secret"),
    admin: (listen: "127.0.0.1:7000"),
    keys: {
        "K1": (kind: "Type", args: ["t:git", "kp:space", "t:live", "kp:enter"]),
        "K2": (kind: "Macro", args: ["open", "https://example.net"], display_output: true),
        "K3": (kind: "Track", id: 42, label: "Support", profile: "dev"),
        "K4": (kind: "Pomodoro", duration: 25),
    },
)"#;

#[test]
fn parses_full_config() {
    let cfg = load_from_str(FULL).expect("valid config");
    assert_eq!(
        cfg.port.as_deref(),
        Some(Path::new("/dev/tty.usbmodem1421"))
    );
    let tracking = cfg.tracking.as_ref().expect("tracking");
    assert_eq!(tracking.base_url, "https://track.example.net/api");
    assert_eq!(tracking.resolved_token(), "secret");
    assert_eq!(cfg.admin.as_ref().map(|a| a.listen.as_str()), Some("127.0.0.1:7000"));
    assert_eq!(cfg.keys.len(), 4);

    let k1 = cfg.descriptor("K1").expect("K1");
    assert_eq!(k1.kind, "Type");
    assert_eq!(k1.args.len(), 4);

    let k2 = cfg.descriptor("K2").expect("K2");
    assert!(k2.display_output);
    assert_eq!(k2.args[0], "open");

    let k3 = cfg.descriptor("K3").expect("K3");
    assert_eq!((k3.id, k3.label.as_str(), k3.profile.as_str()), (42, "Support", "dev"));

    assert_eq!(cfg.descriptor("K4").map(|d| d.duration), Some(25));
    assert!(cfg.descriptor("K9").is_none());
}

#[test]
fn missing_sections_default() {
    let cfg = load_from_str(r#"(keys: {"K1": (kind: "Macro", args: ["true"])})"#).expect("cfg");
    assert!(cfg.port.is_none());
    assert!(cfg.tracking.is_none());
    assert!(cfg.admin.is_none());
    let k1 = cfg.descriptor("K1").expect("K1");
    assert!(!k1.display_output);
    assert_eq!(k1.duration, 0);
}

#[test]
fn unknown_kind_still_parses() {
    let cfg = load_from_str(r#"(keys: {"K1": (kind: "Juggle")})"#).expect("cfg");
    assert_eq!(cfg.descriptor("K1").map(|d| d.kind.as_str()), Some("Juggle"));
}

#[test]
fn unknown_field_is_a_parse_error() {
    let err = load_from_str(r#"(keys: {"K1": (kind: "Type", colour: "red")})"#).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }), "got {err:?}");
}

#[test]
fn zero_duration_pomodoro_is_rejected() {
    let err = load_from_str(r#"(keys: {"K4": (kind: "pomodoro")})"#).unwrap_err();
    match err {
        Error::Validation { key, .. } => assert_eq!(key, "K4"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_key_is_rejected() {
    let err = load_from_str(r#"(keys: {"": (kind: "Type")})"#).unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}

#[test]
fn load_from_path_attaches_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("macropad.ron");
    fs::write(&path, "(keys: {").expect("write");
    let err = load_from_path(&path).unwrap_err();
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.pretty().starts_with("Config parse error in"));

    fs::write(&path, FULL).expect("write");
    let cfg = load_from_path(&path).expect("cfg");
    assert_eq!(cfg.keys.len(), 4);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.ron");
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(err.pretty().starts_with("Read error at"));
}

#[test]
fn explicit_path_wins() {
    let p = Path::new("/tmp/elsewhere.ron");
    assert_eq!(resolve_config_path(Some(p)).expect("path"), p);
}
