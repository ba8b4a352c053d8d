//! Typed configuration keys.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{ConfigFile, ConfigFileError};

/// A `section.key` configuration setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServiceEndpoint,
    ServiceProject,
    ServiceTokenEnv,
    ServiceTimeoutSecs,
    ExportPollIntervalMs,
    ExportTimeoutSecs,
    ExportMaxPixels,
    DownloadChunkSize,
    DownloadDirectory,
    LoggingDirectory,
}

const ALL_KEYS: [ConfigKey; 10] = [
    ConfigKey::ServiceEndpoint,
    ConfigKey::ServiceProject,
    ConfigKey::ServiceTokenEnv,
    ConfigKey::ServiceTimeoutSecs,
    ConfigKey::ExportPollIntervalMs,
    ConfigKey::ExportTimeoutSecs,
    ConfigKey::ExportMaxPixels,
    ConfigKey::DownloadChunkSize,
    ConfigKey::DownloadDirectory,
    ConfigKey::LoggingDirectory,
];

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &ALL_KEYS
    }

    pub fn section(&self) -> &'static str {
        match self {
            Self::ServiceEndpoint
            | Self::ServiceProject
            | Self::ServiceTokenEnv
            | Self::ServiceTimeoutSecs => "service",
            Self::ExportPollIntervalMs | Self::ExportTimeoutSecs | Self::ExportMaxPixels => {
                "export"
            }
            Self::DownloadChunkSize | Self::DownloadDirectory => "download",
            Self::LoggingDirectory => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            Self::ServiceEndpoint => "endpoint",
            Self::ServiceProject => "project",
            Self::ServiceTokenEnv => "token_env",
            Self::ServiceTimeoutSecs => "timeout_secs",
            Self::ExportPollIntervalMs => "poll_interval_ms",
            Self::ExportTimeoutSecs => "timeout_secs",
            Self::ExportMaxPixels => "max_pixels",
            Self::DownloadChunkSize => "chunk_size",
            Self::DownloadDirectory => "directory",
            Self::LoggingDirectory => "directory",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as text; empty when an optional key is unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };
        match self {
            Self::ServiceEndpoint => config.service.endpoint.clone(),
            Self::ServiceProject => config.service.project.clone(),
            Self::ServiceTokenEnv => config.service.token_env.clone(),
            Self::ServiceTimeoutSecs => config.service.timeout_secs.to_string(),
            Self::ExportPollIntervalMs => config.export.poll_interval_ms.to_string(),
            Self::ExportTimeoutSecs => config.export.timeout_secs.to_string(),
            Self::ExportMaxPixels => config.export.max_pixels.to_string(),
            Self::DownloadChunkSize => config.download.chunk_size.to_string(),
            Self::DownloadDirectory => path(&config.download.directory),
            Self::LoggingDirectory => path(&config.logging.directory),
        }
    }

    /// Parse and store a value.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigFileError> {
        let value = value.trim();
        match self {
            Self::ServiceEndpoint => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(self.invalid(value, "must be an http(s) URL"));
                }
                config.service.endpoint = value.trim_end_matches('/').to_string();
            }
            Self::ServiceProject => config.service.project = value.to_string(),
            Self::ServiceTokenEnv => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.service.token_env = value.to_string();
            }
            Self::ServiceTimeoutSecs => config.service.timeout_secs = self.positive(value)?,
            Self::ExportPollIntervalMs => config.export.poll_interval_ms = self.positive(value)?,
            Self::ExportTimeoutSecs => {
                config.export.timeout_secs = value
                    .parse()
                    .map_err(|_| self.invalid(value, "must be a whole number of seconds"))?;
            }
            Self::ExportMaxPixels => {
                let pixels: f64 = value
                    .parse()
                    .map_err(|_| self.invalid(value, "must be a number"))?;
                if !(pixels.is_finite() && pixels > 0.0) {
                    return Err(self.invalid(value, "must be greater than zero"));
                }
                config.export.max_pixels = pixels;
            }
            Self::DownloadChunkSize => config.download.chunk_size = self.positive(value)? as usize,
            Self::DownloadDirectory => config.download.directory = optional_path(value),
            Self::LoggingDirectory => config.logging.directory = optional_path(value),
        }
        Ok(())
    }

    fn positive(&self, value: &str) -> Result<u64, ConfigFileError> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(self.invalid(value, "must be a positive whole number")),
        }
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigFileError {
        ConfigFileError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn optional_path(value: &str) -> Option<PathBuf> {
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key_name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| ConfigFileError::UnknownKey(s.to_string()))
    }
}
