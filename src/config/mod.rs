use crate::s3::StorageError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Object-storage configuration: endpoint, credentials, bucket
///
/// The library reads this fresh from the process environment on every
/// operation (nothing is cached between calls), so tests and long-running
/// callers can change the environment without a restart. An explicit value
/// can also be injected wherever a `StorageConfig` is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Full endpoint URL, including any base path (e.g. Supabase's
    /// `https://<ref>.supabase.co/storage/v1/s3`)
    pub endpoint: String,

    /// AWS region (default: us-east-1)
    #[serde(default = "default_region")]
    pub region: String,

    /// AWS access key ID
    pub access_key: String,

    /// AWS secret access key
    pub secret_key: String,

    /// Bucket holding the application's objects
    pub bucket: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl StorageConfig {
    /// Load configuration from environment variables, read fresh:
    /// - `S3_ENDPOINT` (required, full URL)
    /// - `S3_REGION` (optional; absent, empty, or whitespace falls back to us-east-1)
    /// - `S3_ACCESS_KEY` (required)
    /// - `S3_SECRET_KEY` (required)
    /// - `S3_BUCKET` (required)
    pub fn from_env() -> std::result::Result<Self, StorageError> {
        let config = Self {
            endpoint: require_env("S3_ENDPOINT")?,
            region: std::env::var("S3_REGION")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_region),
            access_key: require_env("S3_ACCESS_KEY")?,
            secret_key: require_env("S3_SECRET_KEY")?,
            bucket: require_env("S3_BUCKET")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every required field is non-empty.
    ///
    /// Runs before any cryptographic or network work, on every call path.
    pub fn validate(&self) -> std::result::Result<(), StorageError> {
        for (name, value) in [
            ("S3_ENDPOINT", &self.endpoint),
            ("S3_ACCESS_KEY", &self.access_key),
            ("S3_SECRET_KEY", &self.secret_key),
            ("S3_BUCKET", &self.bucket),
        ] {
            if value.trim().is_empty() {
                return Err(StorageError::Config(format!(
                    "{} is missing or empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<StorageConfig> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: StorageConfig =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    config.validate()?;
    Ok(config)
}

/// Load configuration from file or environment
///
/// Tries the YAML file when a path is given, otherwise reads the environment
/// (with `.env` support for local development).
pub fn load_config(config_path: Option<&str>) -> Result<StorageConfig> {
    if let Some(path) = config_path {
        load_from_yaml(path)
    } else {
        // Try to load .env file if it exists (don't fail if it doesn't)
        let _ = dotenvy::dotenv();
        Ok(StorageConfig::from_env()?)
    }
}

fn require_env(name: &'static str) -> std::result::Result<String, StorageError> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StorageError::Config(format!("{} is missing or empty", name)))
}

#[cfg(test)]
pub(crate) fn env_guard() -> std::sync::MutexGuard<'static, ()> {
    // Serializes tests that mutate the process environment
    use std::sync::{Mutex, OnceLock};
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
