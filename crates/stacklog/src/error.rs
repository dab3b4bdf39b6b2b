//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Error taxonomy for logging configuration loading."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the configuration loaders.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while reading a [`crate::LoggingConfig`] from disk or text.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path:?}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file was read but is not valid TOML for the schema.
    #[error("failed to parse configuration at {path:?}")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
    /// Inline configuration text is not valid TOML for the schema.
    #[error("failed to parse configuration: {0}")]
    Syntax(#[from] toml::de::Error),
    /// None of the candidate paths existed and no override was set.
    #[error("no configuration files found. inspected: {inspected}")]
    NotFound {
        /// Comma separated list of inspected paths.
        inspected: String,
    },
}
