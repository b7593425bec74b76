use std::env;
use std::fs;
use std::sync::{Mutex, MutexGuard, OnceLock};
use tempfile::TempDir;

use s3relay::config;
use s3relay::{StorageConfig, StorageError};

/// Serializes tests that mutate the process environment
fn env_guard() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_env(endpoint: &str, region: Option<&str>, bucket: &str) {
    env::set_var("S3_ENDPOINT", endpoint);
    match region {
        Some(region) => env::set_var("S3_REGION", region),
        None => env::remove_var("S3_REGION"),
    }
    env::set_var("S3_ACCESS_KEY", "AKIATEST");
    env::set_var("S3_SECRET_KEY", "secrettest");
    env::set_var("S3_BUCKET", bucket);
}

fn clear_env() {
    for var in [
        "S3_ENDPOINT",
        "S3_REGION",
        "S3_ACCESS_KEY",
        "S3_SECRET_KEY",
        "S3_BUCKET",
    ] {
        env::remove_var(var);
    }
}

/// Test loading configuration from environment variables
#[test]
fn test_load_env_config() {
    let _guard = env_guard();
    set_env("https://s3.example.com", Some("eu-west-3"), "assets");

    let config = StorageConfig::from_env().unwrap();
    assert_eq!(config.endpoint, "https://s3.example.com");
    assert_eq!(config.region, "eu-west-3");
    assert_eq!(config.access_key, "AKIATEST");
    assert_eq!(config.secret_key, "secrettest");
    assert_eq!(config.bucket, "assets");

    clear_env();
}

/// Environment is read fresh on every call, never cached
#[test]
fn test_env_is_not_cached_between_calls() {
    let _guard = env_guard();
    set_env("https://s3.example.com", None, "assets");

    let first = StorageConfig::from_env().unwrap();
    assert_eq!(first.bucket, "assets");

    env::set_var("S3_BUCKET", "other-bucket");
    let second = StorageConfig::from_env().unwrap();
    assert_eq!(second.bucket, "other-bucket");

    env::remove_var("S3_BUCKET");
    assert!(StorageConfig::from_env().is_err());

    clear_env();
}

/// Missing or empty required variables fail with a configuration error
#[test]
fn test_required_variables() {
    let _guard = env_guard();

    for var in ["S3_ENDPOINT", "S3_ACCESS_KEY", "S3_SECRET_KEY", "S3_BUCKET"] {
        set_env("https://s3.example.com", None, "assets");
        env::remove_var(var);

        let err = StorageConfig::from_env().unwrap_err();
        assert!(
            matches!(&err, StorageError::Config(msg) if msg.contains(var)),
            "expected configuration error naming {}, got {:?}",
            var,
            err
        );
    }

    clear_env();
}

/// Region falls back to us-east-1 when absent, empty, or whitespace
#[test]
fn test_region_default() {
    let _guard = env_guard();

    set_env("https://s3.example.com", None, "assets");
    assert_eq!(StorageConfig::from_env().unwrap().region, "us-east-1");

    set_env("https://s3.example.com", Some(""), "assets");
    assert_eq!(StorageConfig::from_env().unwrap().region, "us-east-1");

    set_env("https://s3.example.com", Some("  "), "assets");
    assert_eq!(StorageConfig::from_env().unwrap().region, "us-east-1");

    clear_env();
}

/// Test loading configuration from a YAML file
#[test]
fn test_load_yaml_config() {
    let yaml = r#"
endpoint: https://abc.supabase.co/storage/v1/s3
region: eu-west-3
access_key: AKIATEST
secret_key: secrettest
bucket: assets
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    let config = config::load_from_yaml(&config_path).unwrap();
    assert_eq!(config.endpoint, "https://abc.supabase.co/storage/v1/s3");
    assert_eq!(config.region, "eu-west-3");
    assert_eq!(config.bucket, "assets");
}

/// A YAML config with an empty required field is rejected
#[test]
fn test_yaml_config_validated() {
    let yaml = r#"
endpoint: https://s3.example.com
access_key: AKIATEST
secret_key: ""
bucket: assets
"#;

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, yaml).unwrap();

    assert!(config::load_from_yaml(&config_path).is_err());
}
