use amber_monitor::config::{Config, ViewerZone};
use amber_monitor::report::{LiveRange, ReportOptions};
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.timezone = "Australia/Brisbane".to_string();
    cfg.report.overview_days = 14;
    cfg.store.path = tmp_dir
        .path()
        .join("session.json")
        .to_string_lossy()
        .to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.timezone, "Australia/Brisbane");
    assert_eq!(loaded.report.overview_days, 14);
    assert_eq!(loaded.store.path, cfg.store.path);
    assert!(loaded.validate().is_ok());

    let options = ReportOptions::from_config(&loaded).unwrap();
    assert_eq!(options.overview_days, 14);
    assert_eq!(
        options.zone,
        ViewerZone::Named(chrono_tz::Australia::Brisbane)
    );
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    cfg.api.timeout_seconds = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.api.resolution_minutes = 0;
    assert!(cfg.validate().is_err());

    // Chunks wider than the API allows
    cfg = Config::default();
    cfg.report.max_chunk_days = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.report.overview_days = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.live.refresh_interval_seconds = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.live.default_range = "today".to_string();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.default_live_range().unwrap(), LiveRange::Today);
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"api: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn missing_file_is_an_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(format!("{}", err).contains("I/O error"));
}
