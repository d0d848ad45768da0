use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct MoodlogConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub reminders: ReminderSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

/// Local tuning for the reminder scheduler. The reminder itself (enabled,
/// time of day) lives in the remote settings.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReminderSettings {
    pub poll_interval_secs: u64,
    pub grace_secs: u64,
    pub tolerance_secs: u64,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_moodlog_dir()
            .join("local.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            grace_secs: 60,
            tolerance_secs: 5,
            title: "Time to check in with Eli".into(),
            body: "How are you feeling today? Take a moment to reflect and share with Eli.".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".into(),
        }
    }
}

impl ReminderSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.grace_secs as i64)
    }

    pub fn tolerance(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.tolerance_secs as i64)
    }
}

/// Returns `~/.moodlog/`, or `./.moodlog/` when no home directory is known.
pub fn default_moodlog_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".moodlog")
}

/// Returns the default config file path: `~/.moodlog/config.toml`
pub fn default_config_path() -> PathBuf {
    default_moodlog_dir().join("config.toml")
}

impl MoodlogConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MoodlogConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (MOODLOG_BACKEND_URL, MOODLOG_DB, MOODLOG_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOODLOG_BACKEND_URL") {
            self.api.base_url = val;
        }
        if let Ok(val) = std::env::var("MOODLOG_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MOODLOG_LOG_LEVEL") {
            self.logging.log_level = val;
        }
    }

    /// Resolve the local store path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
