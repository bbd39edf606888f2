//! Integration tests for configuration loading and database path resolution
//!
//! Tests that touch CINE_CONFIG or CINE_DATABASE are marked #[serial] so they
//! never observe each other's environment.

use cine_common::config::{
    resolve_database_path, TomlConfig, CONFIG_ENV_VAR, DATABASE_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(DATABASE_ENV_VAR, "/tmp/cine-env.db");

    let config = TomlConfig {
        database_path: Some(PathBuf::from("/tmp/cine-toml.db")),
        ..Default::default()
    };
    let path = resolve_database_path(None, &config);

    env::remove_var(DATABASE_ENV_VAR);
    assert_eq!(path, PathBuf::from("/tmp/cine-env.db"));
}

#[test]
#[serial]
fn test_toml_beats_default() {
    env::remove_var(DATABASE_ENV_VAR);

    let config = TomlConfig {
        database_path: Some(PathBuf::from("/tmp/cine-toml.db")),
        ..Default::default()
    };
    assert_eq!(
        resolve_database_path(None, &config),
        PathBuf::from("/tmp/cine-toml.db")
    );
}

#[test]
#[serial]
fn test_default_path_ends_with_cine_db() {
    env::remove_var(DATABASE_ENV_VAR);

    let path = resolve_database_path(None, &TomlConfig::default());
    assert!(path.ends_with("cine.db"));
}

#[test]
#[serial]
fn test_discovered_malformed_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[validation\nbroken").unwrap();

    env::set_var(CONFIG_ENV_VAR, &config_path);
    let config = TomlConfig::load(None);
    env::remove_var(CONFIG_ENV_VAR);

    let config = config.expect("discovered config must never be fatal");
    assert_eq!(config.validation.far_future_days, 30);
}

#[test]
#[serial]
fn test_discovered_file_is_loaded() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "[validation]\nfar_future_days = 60\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    env::set_var(CONFIG_ENV_VAR, &config_path);
    let config = TomlConfig::load(None);
    env::remove_var(CONFIG_ENV_VAR);

    let config = config.unwrap();
    assert_eq!(config.validation.far_future_days, 60);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let result = TomlConfig::load(Some(Path::new("/nonexistent/cine/config.toml")));
    assert!(result.is_err());
}
