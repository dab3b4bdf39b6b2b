//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Logging and stack trace configuration model."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Configuration for the logging facade.
//!
//! Every option is stored as an `Option` so that "never configured" stays
//! distinguishable from an explicit falsy value. The getters collapse both
//! cases into a zero value (`""`, `false`, `0`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Function name prefix of the AWS Lambda runtime's handler loop.
///
/// Lambda mode stops the ancestor trace at the first frame starting with this
/// name unless another stop function was configured.
pub const LAMBDA_ENTRY_POINT: &str = "lambda_runtime::run";

/// Level applied when none was configured.
pub const DEFAULT_LEVEL: &str = "info";

/// Options controlling how much of the call stack is attached to each record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTraceConfig {
    /// Maximum number of ancestor frames. `0` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
    /// File path suffix that ends the trace once a matching frame is included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_file: Option<String>,
    /// Fully qualified function name that ends the trace, e.g. `my_app::main`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_function: Option<String>,
    /// Tailors stop behaviour to a serverless runtime entry point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda: Option<bool>,
}

impl StackTraceConfig {
    /// Create a configuration with every option unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the trace to `max_entries` frames.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Stop after the first frame whose file ends with `stop_file`.
    pub fn with_stop_file(mut self, stop_file: impl Into<String>) -> Self {
        self.stop_file = Some(stop_file.into());
        self
    }

    /// Stop after the frame whose function equals `stop_function`.
    pub fn with_stop_function(mut self, stop_function: impl Into<String>) -> Self {
        self.stop_function = Some(stop_function.into());
        self
    }

    /// Enable or disable lambda mode.
    pub fn with_lambda(mut self, lambda: bool) -> Self {
        self.lambda = Some(lambda);
        self
    }

    /// Configured frame limit, `0` when unset.
    pub fn max_entries(&self) -> usize {
        self.max_entries.unwrap_or_default()
    }

    /// Configured stop file, `""` when unset.
    pub fn stop_file(&self) -> &str {
        self.stop_file.as_deref().unwrap_or_default()
    }

    /// Configured stop function, `""` when unset.
    pub fn stop_function(&self) -> &str {
        self.stop_function.as_deref().unwrap_or_default()
    }

    /// Whether lambda mode is enabled.
    pub fn lambda(&self) -> bool {
        self.lambda.unwrap_or_default()
    }

    fn fill_lambda_stop_function(&mut self) {
        if self.lambda() && self.stop_function.is_none() {
            self.stop_function = Some(LAMBDA_ENTRY_POINT.to_owned());
        }
    }
}

/// Settings for the logging facade.
///
/// Built once, then installed with [`crate::logger::init_with_options`] or
/// [`crate::logger::install`]. The installed value is never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file to append to. Records go to standard output when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Attach the calling file, line and function to each record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_location: Option<bool>,
    /// Minimum level, e.g. `debug` or `warn`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Ancestor trace options. Absent means only the caller is recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTraceConfig>,
}

impl LoggingConfig {
    /// Environment variable naming a configuration file that overrides the candidates.
    pub const ENV_CONFIG_PATH: &str = "STACKLOG_CONFIG";

    /// Create a configuration with every option unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration installed by [`crate::logger::init`].
    pub fn defaults() -> Self {
        Self::new()
            .with_include_location(true)
            .with_level(DEFAULT_LEVEL)
    }

    /// Append records to `file` instead of standard output.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Enable or disable caller location capture.
    pub fn with_include_location(mut self, include_location: bool) -> Self {
        self.include_location = Some(include_location);
        self
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Attach ancestor trace options.
    pub fn with_stack_trace(mut self, stack_trace: StackTraceConfig) -> Self {
        self.stack_trace = Some(stack_trace);
        self
    }

    /// Configured log file, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Whether caller location is captured, `false` when unset.
    pub fn include_location(&self) -> bool {
        self.include_location.unwrap_or_default()
    }

    /// Configured level, `""` when unset.
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or_default()
    }

    /// Ancestor trace options, if trace collection is enabled.
    pub fn stack_trace(&self) -> Option<&StackTraceConfig> {
        self.stack_trace.as_ref()
    }

    /// Apply installation-time defaults: lambda mode fills in the runtime
    /// entry point as stop function when none was chosen.
    pub(crate) fn into_installed(mut self) -> Self {
        if let Some(stack_trace) = self.stack_trace.as_mut() {
            stack_trace.fill_lambda_stop_function();
        }
        self
    }

    /// Load configuration from disk, respecting the `STACKLOG_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                return Self::from_path(env_path);
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                return Self::from_path(candidate);
            }
        }

        Err(ConfigError::NotFound {
            inspected: candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Read a TOML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(config_path = %path.display(), "loading logging configuration");
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl std::str::FromStr for LoggingConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_return_zero_values_when_unset() {
        let config = LoggingConfig::new();
        assert!(!config.include_location());
        assert_eq!(config.level(), "");
        assert!(config.file().is_none());
        assert!(config.stack_trace().is_none());

        let stack_trace = StackTraceConfig::new();
        assert_eq!(stack_trace.max_entries(), 0);
        assert_eq!(stack_trace.stop_file(), "");
        assert_eq!(stack_trace.stop_function(), "");
        assert!(!stack_trace.lambda());
    }

    #[test]
    fn unset_is_distinct_from_zero() {
        let unset = StackTraceConfig::new();
        let zero = StackTraceConfig::new().with_max_entries(0);
        assert_eq!(unset.max_entries(), zero.max_entries());
        assert_ne!(unset, zero);
        assert_eq!(zero.max_entries, Some(0));
    }

    #[test]
    fn lambda_fills_stop_function_on_install() {
        let config = LoggingConfig::new()
            .with_stack_trace(StackTraceConfig::new().with_lambda(true))
            .into_installed();
        let stack_trace = config.stack_trace().expect("stack trace configured");
        assert_eq!(stack_trace.stop_function(), LAMBDA_ENTRY_POINT);
    }

    #[test]
    fn lambda_keeps_explicit_stop_function() {
        let config = LoggingConfig::new()
            .with_stack_trace(
                StackTraceConfig::new()
                    .with_lambda(true)
                    .with_stop_function("handler::run"),
            )
            .into_installed();
        let stack_trace = config.stack_trace().expect("stack trace configured");
        assert_eq!(stack_trace.stop_function(), "handler::run");
    }

    #[test]
    fn install_without_lambda_leaves_stop_function_unset() {
        let config = LoggingConfig::new()
            .with_stack_trace(StackTraceConfig::new().with_max_entries(2))
            .into_installed();
        assert!(config.stack_trace().unwrap().stop_function.is_none());
    }

    #[test]
    fn parses_toml() {
        let config: LoggingConfig = r#"
            file = "logs/app.log"
            include_location = true
            level = "debug"

            [stack_trace]
            max_entries = 5
            stop_file = "main.rs"
            lambda = true
        "#
        .parse()
        .unwrap();
        assert_eq!(config.file(), Some(Path::new("logs/app.log")));
        assert!(config.include_location());
        assert_eq!(config.level(), "debug");
        let stack_trace = config.stack_trace().unwrap();
        assert_eq!(stack_trace.max_entries, Some(5));
        assert_eq!(stack_trace.stop_file(), "main.rs");
        assert!(stack_trace.stop_function.is_none());
        assert!(stack_trace.lambda());
    }

    #[test]
    fn empty_stack_trace_table_enables_tracing() {
        let config: LoggingConfig = "[stack_trace]\n".parse().unwrap();
        assert_eq!(config.stack_trace(), Some(&StackTraceConfig::new()));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = "include_location = \"yes\"".parse::<LoggingConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Syntax(_)));
    }

    #[test]
    fn load_reports_missing_candidates() {
        let err = LoggingConfig::load(&["does/not/exist.toml"]).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
