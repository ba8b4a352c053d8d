//! INI configuration file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::download::DEFAULT_CHUNK_SIZE;
use crate::export::{MonitorSettings, DEFAULT_MAX_PIXELS, DEFAULT_POLL_INTERVAL};
use crate::logging::default_log_dir;
use crate::service::{ServiceConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_ENV};

use super::keys::ConfigKey;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to access config file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Path of the configuration file: `<config dir>/cloudfree/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cloudfree")
        .join("config.ini")
}

/// `[service]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub project: String,
    pub token_env: String,
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project: String::new(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[export]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub poll_interval_ms: u64,
    /// Zero means unbounded.
    pub timeout_secs: u64,
    pub max_pixels: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            timeout_secs: 0,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    pub chunk_size: usize,
    /// Defaults to the current directory.
    pub directory: Option<PathBuf>,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            directory: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingSettings {
    /// Defaults to [`default_log_dir`].
    pub directory: Option<PathBuf>,
}

/// Parsed configuration file. Missing keys keep their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub service: ServiceSettings,
    pub export: ExportSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigFileError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }
        Ok(config)
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its directory. Unset optional keys are
    /// omitted.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        let io_error = |source: io::Error| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini.write_to_file(path).map_err(io_error)
    }

    /// Connection settings for the imagery service.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::new(self.service.project.clone())
            .with_endpoint(self.service.endpoint.clone())
            .with_token_env(self.service.token_env.clone())
            .with_timeout(Duration::from_secs(self.service.timeout_secs))
    }

    /// Export polling settings.
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_millis(self.export.poll_interval_ms),
            timeout: match self.export.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }

    /// Download directory, defaulting to the current directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Log directory, defaulting to [`default_log_dir`].
    pub fn log_dir(&self) -> PathBuf {
        self.logging
            .directory
            .clone()
            .unwrap_or_else(default_log_dir)
    }
}
