//! Application configuration management.
//!
//! Handles loading, saving, and managing application-wide settings: where
//! watch progress is persisted and which playlist source answers fetches.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, PersistenceError, Result};
use crate::progress::default_progress_path;
use crate::session::AdvancePolicy;

/// Environment variable overriding [`ServiceConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "PLAYVIEW_ENDPOINT";

/// Environment variable overriding [`ServiceConfig::api_key`].
pub const API_KEY_ENV: &str = "PLAYVIEW_API_KEY";

/// Default timeout for playlist service requests.
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;

/// Where playlist data comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistSource {
    /// Remote playlist service (default).
    #[default]
    Service,
    /// Built-in sample playlist, for offline use.
    Sample,
}

impl std::fmt::Display for PlaylistSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Service => write!(f, "Service"),
            Self::Sample => write!(f, "Sample"),
        }
    }
}

/// Settings for the remote playlist service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// URL the playlist request is POSTed to.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Key sent as bearer token and `apikey` header.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

const fn default_timeout() -> u64 {
    DEFAULT_SERVICE_TIMEOUT_SECS
}

const fn default_true() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: DEFAULT_SERVICE_TIMEOUT_SECS,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// File holding persisted watch progress.
    #[serde(default = "default_progress_path")]
    pub progress_file: PathBuf,
    /// Playlist source.
    #[serde(default)]
    pub source: PlaylistSource,
    /// Remote playlist service settings.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Whether player URLs request autoplay.
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Whether moving to the next video marks the one being left as watched.
    #[serde(default = "default_true")]
    pub complete_on_advance: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            progress_file: default_progress_path(),
            source: PlaylistSource::default(),
            service: ServiceConfig::default(),
            autoplay: true,
            complete_on_advance: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or create defaults if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found, using defaults");
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                warn!("Failed to save default config: {}", e);
            }
            return Ok(config);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Persistence(PersistenceError::ReadFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to read config file: {e}"),
            })
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;

        info!("Loaded config from {}", path.display());
        debug!("Progress file: {}", config.progress_file.display());

        Ok(config)
    }

    /// Save configuration to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Persistence(PersistenceError::CreateDirFailed {
                    path: parent.to_path_buf(),
                    reason: format!("Failed to create config directory: {e}"),
                })
            })?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            Error::Persistence(PersistenceError::WriteFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write config file: {e}"),
            })
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Apply `PLAYVIEW_ENDPOINT` / `PLAYVIEW_API_KEY` overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        )
    }

    fn with_overrides(mut self, endpoint: Option<String>, api_key: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            debug!("Service endpoint overridden from environment");
            self.service.endpoint = Some(endpoint);
        }
        if let Some(api_key) = api_key.filter(|v| !v.trim().is_empty()) {
            self.service.api_key = Some(api_key);
        }
        self
    }

    /// Check the settings needed by the selected playlist source.
    ///
    /// # Errors
    ///
    /// Returns an error if the service source is selected without an endpoint,
    /// or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.source == PlaylistSource::Service {
            let has_endpoint = self
                .service
                .endpoint
                .as_deref()
                .is_some_and(|e| e.starts_with("http://") || e.starts_with("https://"));
            if !has_endpoint {
                return Err(Error::Configuration(format!(
                    "Playlist service endpoint must be an http(s) URL \
                     (set {ENDPOINT_ENV} or use the sample source)"
                )));
            }
        }
        if self.service.timeout_secs == 0 {
            return Err(Error::Configuration(
                "Service timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Session advance policy selected by `complete_on_advance`.
    #[must_use]
    pub const fn advance_policy(&self) -> AdvancePolicy {
        if self.complete_on_advance {
            AdvancePolicy::CompleteDeparted
        } else {
            AdvancePolicy::KeepProgress
        }
    }

    /// Get the path to the config file.
    #[must_use]
    pub fn config_file_path() -> PathBuf {
        config_file_path()
    }
}

/// Get the path to the config file.
fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("playview")
        .join("config.json")
}

/// Configuration manager that handles loading and caching config.
pub struct ConfigManager {
    config: AppConfig,
    path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager, loading config from the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded.
    pub fn new() -> Result<Self> {
        Self::with_path(config_file_path())
    }

    /// Create a config manager backed by `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded.
    pub fn with_path(path: PathBuf) -> Result<Self> {
        let config = AppConfig::load_from(&path)?.with_env_overrides();
        Ok(Self { config, path })
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Path of the backing config file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Update the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or cannot be saved.
    pub fn update(&mut self, config: AppConfig) -> Result<()> {
        config.validate()?;
        config.save_to(&self.path)?;
        self.config = config;
        Ok(())
    }

    /// Switch the playlist source.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting config is invalid or cannot be saved.
    pub fn set_source(&mut self, source: PlaylistSource) -> Result<()> {
        let config = AppConfig {
            source,
            ..self.config.clone()
        };
        self.update(config)
    }

    /// Reset to default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be saved.
    pub fn reset(&mut self) -> Result<()> {
        self.config = AppConfig::default();
        self.config.save_to(&self.path)?;
        Ok(())
    }
}
