use crate::ENV_MUTEX;
use clap::Parser;
use figment::providers::Serialized;
use shelf::actions::Fate;
use shelf::cli::{Cli, Commands, DuplicatesArgs};
use shelf::config::{Config, ConfigError};
use shelf::duplicates::{DetectionMode, SparePolicy};
use shelf::output::OutputFormat;
use std::fs;
use tempfile::tempdir;

fn args(argv: &[&str]) -> DuplicatesArgs {
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Duplicates(args) => args,
    }
}

#[test]
fn test_config_load_defaults() {
    // figment without Env so other tests cannot interfere
    let figment = figment::Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();

    let settings = config.resolve().unwrap();
    assert_eq!(settings.mode, DetectionMode::Content);
    assert_eq!(settings.policy, SparePolicy::Oldest);
    assert_eq!(settings.fate, Fate::Report);
    assert_eq!(settings.output, OutputFormat::Text);
    assert_eq!(settings.io_threads, 4);
    assert_eq!(settings.quarantine_dir, "__duplicates__");
    assert!(!settings.recursive);
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
detection_mode = "name"
spare = "newest"
fate = "quarantine"
io_threads = 8
quarantine_dir = "held"
"#,
    )
    .unwrap();

    let settings = Config::try_load_from_path(&config_path)
        .unwrap()
        .resolve()
        .unwrap();

    assert_eq!(settings.mode, DetectionMode::Name);
    assert_eq!(settings.policy, SparePolicy::Newest);
    assert_eq!(settings.fate, Fate::Quarantine);
    assert_eq!(settings.io_threads, 8);
    assert_eq!(settings.quarantine_dir, "held");
}

#[test]
fn test_env_overrides_file_and_cli_overrides_env() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "spare = \"biggest\"\nio_threads = 2\n").unwrap();

    std::env::set_var("SHELF_SPARE", "smallest");
    std::env::set_var("SHELF_IO_THREADS", "6");
    let mut config = Config::try_load_from_path(&config_path).unwrap();
    std::env::remove_var("SHELF_SPARE");
    std::env::remove_var("SHELF_IO_THREADS");

    assert_eq!(config.spare, "smallest");
    assert_eq!(config.io_threads, 6);

    config.merge_args(&args(&["shelf", "duplicates", "--spare", "new", "-s", "-r"]));
    let settings = config.resolve().unwrap();
    assert_eq!(settings.policy, SparePolicy::Newest);
    assert_eq!(settings.io_threads, 6);
    assert_eq!(settings.fate, Fate::Remove);
    assert!(settings.recursive);
}

#[test]
fn test_unknown_policy_in_file_fails_resolution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "spare = \"newst\"\n").unwrap();

    let err = Config::try_load_from_path(&config_path)
        .unwrap()
        .resolve()
        .unwrap_err();

    assert!(matches!(err, ConfigError::UnknownPolicy { .. }));
    assert_eq!(
        err.to_string(),
        "unknown spare policy 'newst' (did you mean 'newest'?)"
    );
}

#[test]
fn test_malformed_file_is_a_load_error() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = \"many\"\n").unwrap();

    assert!(matches!(
        Config::try_load_from_path(&config_path),
        Err(ConfigError::Load(_))
    ));
    // The forgiving loader falls back to the other layers.
    assert_eq!(Config::load_from_path(&config_path).io_threads, 4);
}

#[test]
fn test_saved_config_loads_back() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nested/config.toml");

    let config = Config {
        spare: "random".to_string(),
        fate: "quarantine".to_string(),
        skip_hidden: true,
        ..Config::default()
    };
    config.save_to_path(&config_path).unwrap();

    let loaded = Config::try_load_from_path(&config_path).unwrap();
    assert_eq!(loaded.spare, "random");
    assert_eq!(loaded.fate, "quarantine");
    assert!(loaded.skip_hidden);
}
