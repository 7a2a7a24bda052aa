//! Settings Persistence System
//!
//! Persistent application settings with atomic writes, an advisory lock
//! against concurrent writers and tolerant normalization on load.
//!
//! Storage location: {config_dir}/layerdeck/settings.json

use std::fs;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{
    fs::atomic_write_json_pretty,
    hydrate::{HydrationOrder, ImportConfig},
    CoreError, CoreResult,
};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Default commerce API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://dash.brandexperts.ae";

/// Default storefront URL used for cart links
pub const DEFAULT_STOREFRONT_URL: &str = "https://www.brandexperts.ae";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// =============================================================================
// Settings Model
// =============================================================================

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    /// Remote commerce service
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Document import
    #[serde(default)]
    pub import: ImportSettings,

    /// Logging
    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            remote: RemoteSettings::default(),
            import: ImportSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl AppSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected rather than rejected.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.remote.api_base_url =
            normalize_url(&self.remote.api_base_url, DEFAULT_API_BASE_URL);
        self.remote.storefront_url =
            normalize_url(&self.remote.storefront_url, DEFAULT_STOREFRONT_URL);
        self.remote.timeout_secs = self.remote.timeout_secs.clamp(1, 300);

        self.import.asset_root = self
            .import
            .asset_root
            .take()
            .map(|root| root.trim().to_string())
            .filter(|root| !root.is_empty());

        self.logging.level = normalize_enum(&self.logging.level, LOG_LEVELS, default_log_level());
    }
}

fn normalize_url(value: &str, fallback: &str) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        fallback.to_string()
    }
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

/// Remote commerce service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSettings {
    /// Base URL of the commerce API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Base URL of the storefront (cart links)
    #[serde(default = "default_storefront_url")]
    pub storefront_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_storefront_url() -> String {
    DEFAULT_STOREFRONT_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            storefront_url: default_storefront_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Document import settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSettings {
    /// Font/preview ordering within a scene
    #[serde(default)]
    pub hydration_order: HydrationOrder,

    /// Hydrate scenes concurrently
    #[serde(default)]
    pub concurrent_hydration: bool,

    /// Directory relative asset references are resolved against
    #[serde(default)]
    pub asset_root: Option<String>,
}

impl ImportSettings {
    /// Builds the importer configuration
    pub fn to_import_config(&self) -> ImportConfig {
        ImportConfig {
            order: self.hydration_order,
            concurrent: self.concurrent_hydration,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    /// Default level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write daily-rotated log files
    #[serde(default)]
    pub log_to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_to_file: false,
        }
    }
}

// =============================================================================
// Settings Manager
// =============================================================================

/// Default settings directory for the current user
pub fn default_settings_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("layerdeck")
}

/// Loads and saves settings in a directory
#[derive(Debug, Clone)]
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager for the given directory
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or unreadable
    pub fn load(&self) -> AppSettings {
        self.with_lock(false, || Ok(self.read_or_default()))
            .unwrap_or_else(|e| {
                warn!("Failed to lock settings, using defaults: {}", e);
                AppSettings::default()
            })
    }

    /// Caller must hold the settings lock
    fn read_or_default(&self) -> AppSettings {
        match self.read_unlocked() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    fn read_unlocked(&self) -> CoreResult<AppSettings> {
        if !self.settings_path.exists() {
            info!("Settings file not found, using defaults");
            return Ok(AppSettings::default());
        }

        let content = fs::read_to_string(&self.settings_path)?;
        let mut settings = serde_json::from_str::<AppSettings>(&content)?;

        if settings.version < SETTINGS_VERSION {
            info!(
                "Migrating settings from version {} to {}",
                settings.version, SETTINGS_VERSION
            );
            settings.version = SETTINGS_VERSION;
        }

        settings.normalize();
        Ok(settings)
    }

    fn write_unlocked(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        let mut normalized = settings.clone();
        normalized.normalize();

        atomic_write_json_pretty(&self.settings_path, &normalized)?;

        info!("Settings saved to {:?}", self.settings_path);
        Ok(normalized)
    }

    /// Normalize and save settings atomically, returning what was written
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || self.write_unlocked(settings))
    }

    /// Apply a JSON patch of settings fields on top of the stored settings.
    ///
    /// Read, merge and write happen under one exclusive lock.
    pub fn update(&self, patch: serde_json::Value) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let current = serde_json::to_value(self.read_or_default())?;
            let merged = merge_json(current, patch);
            let settings: AppSettings = serde_json::from_value(merged)
                .map_err(|e| CoreError::ValidationError(format!("Invalid settings: {}", e)))?;
            self.write_unlocked(&settings)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }
}

fn merge_json(base: serde_json::Value, patch: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (key, value) in patch {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}
