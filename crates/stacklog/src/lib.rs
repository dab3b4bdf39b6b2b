//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Caller-aware structured logging facade."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Structured logging that records where each record came from.
//!
//! Every log call walks the call stack, skips the facade's own frames and
//! attaches the caller's `file`, `line` and `func` to the JSON record. With a
//! [`StackTraceConfig`] the frames above the caller are attached under
//! `trace`, bounded by a depth limit, a stop function, a stop file or the
//! lambda runtime entry point.
//!
//! ```no_run
//! use stacklog::{LoggingConfig, StackTraceConfig};
//!
//! stacklog::init_with_options(
//!     LoggingConfig::new()
//!         .with_include_location(true)
//!         .with_level("debug")
//!         .with_stack_trace(StackTraceConfig::new().with_max_entries(5)),
//! );
//! stacklog::info!("request handled in {}ms", 12);
//! ```
#![warn(missing_docs)]

pub mod capture;
pub mod config;
pub mod error;
pub mod logger;
mod macros;

pub use capture::{CaptureResult, Fields, Frame};
pub use config::{LoggingConfig, StackTraceConfig, DEFAULT_LEVEL, LAMBDA_ENTRY_POINT};
pub use error::{ConfigError, Result};
pub use logger::{
    active_config, capture, capture_with, init, init_with_options, install, parse_level,
    set_level,
};
pub use tracing::Level;
