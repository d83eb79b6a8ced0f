use chargeguard::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.chargepoint.username = "alice".to_string();
    cfg.chargepoint.password = "hunter2".to_string();
    cfg.monitor.company_name_whitelist =
        Some(["ACME".to_string()].into_iter().collect());

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.chargepoint.username, "alice");
    assert_eq!(
        loaded.monitor.company_name_whitelist,
        cfg.monitor.company_name_whitelist
    );
    assert_eq!(loaded.monitor.active_poll_interval_secs, 120);
}

#[test]
fn config_validation_errors() {
    let valid = {
        let mut cfg = Config::default();
        cfg.chargepoint.username = "alice".to_string();
        cfg.chargepoint.password = "hunter2".to_string();
        cfg
    };
    assert!(valid.validate().is_ok());

    // Missing credentials
    let mut cfg = valid.clone();
    cfg.chargepoint.username.clear();
    assert!(cfg.validate().is_err());

    cfg = valid.clone();
    cfg.chargepoint.password.clear();
    assert!(cfg.validate().is_err());

    // Poll intervals must be non-zero
    cfg = valid.clone();
    cfg.monitor.idle_poll_interval_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = valid.clone();
    cfg.monitor.active_poll_interval_secs = 0;
    assert!(cfg.validate().is_err());

    // Power threshold must be a non-negative number
    cfg = valid.clone();
    cfg.monitor.low_power_threshold_kw = -0.5;
    assert!(cfg.validate().is_err());

    cfg = valid.clone();
    cfg.monitor.low_power_threshold_kw = f64::NAN;
    assert!(cfg.validate().is_err());

    // Streak threshold of zero would stop before the first poll
    cfg = valid.clone();
    cfg.monitor.low_power_streak_threshold = 0;
    assert!(cfg.validate().is_err());

    // An empty whitelist would never match any operator
    cfg = valid.clone();
    cfg.monitor.company_name_whitelist = Some(Default::default());
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}
