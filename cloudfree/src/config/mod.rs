//! User configuration.
//!
//! Settings live in an INI file at `<config dir>/cloudfree/config.ini`.
//! Command-line arguments override file values, which override built-in
//! defaults.

mod file;
mod keys;

pub use file::{
    config_file_path, ConfigFile, ConfigFileError, DownloadSettings, ExportSettings,
    LoggingSettings, ServiceSettings,
};
pub use keys::ConfigKey;
