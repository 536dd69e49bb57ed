// tests/config_files.rs

use std::io::Write;

use tempfile::NamedTempFile;

use jobsched::config::{
    load_and_validate, load_config, load_env_file, load_from_path, ENV_CHECK_INTERVAL,
    ENV_DATABASE_URL,
};
use jobsched::errors::JobschedError;

fn no_env(_: &str) -> Option<String> {
    None
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_file_is_loaded() {
    let file = config_file(
        r#"
[scheduler]
check_interval_secs = 3
initial_max_concurrent_jobs = 7

[store]
database_url = "sqlite:///var/lib/jobsched/jobs.db"

[api]
enabled = false
port = 9090
"#,
    );

    let cfg = load_config(Some(file.path()), no_env).unwrap();
    assert_eq!(cfg.scheduler.check_interval_secs, 3);
    assert_eq!(cfg.scheduler.initial_max_concurrent_jobs, 7);
    assert_eq!(cfg.store.database_url, "sqlite:///var/lib/jobsched/jobs.db");
    assert!(!cfg.api.enabled);
    assert_eq!(cfg.api.port, 9090);
}

#[test]
fn missing_sections_take_defaults() {
    let file = config_file("[api]\nport = 7000\n");

    let cfg = load_config(Some(file.path()), no_env).unwrap();
    assert_eq!(cfg.scheduler.check_interval_secs, 10);
    assert_eq!(cfg.scheduler.initial_max_concurrent_jobs, 5);
    assert_eq!(cfg.store.database_url, "sqlite://jobsched.db");
    assert!(cfg.api.enabled);
    assert_eq!(cfg.api.port, 7000);
}

#[test]
fn environment_beats_the_file() {
    let file = config_file(
        r#"
[scheduler]
check_interval_secs = 3

[store]
database_url = "sqlite://from-file.db"
"#,
    );

    let cfg = load_config(Some(file.path()), |key| match key {
        k if k == ENV_CHECK_INTERVAL => Some("42".to_string()),
        k if k == ENV_DATABASE_URL => Some("sqlite://from-env.db".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(cfg.scheduler.check_interval_secs, 42);
    assert_eq!(cfg.store.database_url, "sqlite://from-env.db");
}

#[test]
fn zero_interval_in_file_is_rejected() {
    let file = config_file("[scheduler]\ncheck_interval_secs = 0\n");

    match load_config(Some(file.path()), no_env) {
        Err(JobschedError::ConfigError(msg)) => assert!(msg.contains("check_interval_secs")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let file = config_file("[scheduler\ncheck_interval_secs = 3\n");

    assert!(matches!(
        load_from_path(file.path()),
        Err(JobschedError::TomlError(_))
    ));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    assert!(matches!(
        load_config(Some(&path), no_env),
        Err(JobschedError::IoError(_))
    ));
}

#[test]
fn env_file_feeds_the_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(
        &path,
        "# scheduler settings\nCHECK_INTERVAL=25\nJOBSCHED_ENV_FILE_MARKER=loaded\n",
    )
    .unwrap();

    // Real environment values win over the file, so only assert on what the
    // file actually controls here.
    let preset_interval = std::env::var(ENV_CHECK_INTERVAL).ok();

    let loaded = load_env_file(Some(&path)).unwrap();
    assert_eq!(loaded, path);
    assert_eq!(
        std::env::var("JOBSCHED_ENV_FILE_MARKER").as_deref(),
        Ok("loaded")
    );

    if preset_interval.is_none() {
        let cfg = load_and_validate(None).unwrap();
        assert_eq!(cfg.scheduler.check_interval_secs, 25);
    }
}

#[test]
fn missing_env_file_is_reported_as_not_found() {
    let dir = tempfile::tempdir().unwrap();

    let err = load_env_file(Some(&dir.path().join(".env"))).unwrap_err();
    assert!(err.not_found());
}
