//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Facade entry points, active configuration and level handling."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! The logging facade.
//!
//! Everything that runs between a user's log call and the stack walk lives in
//! this directory, which is how the walker tells facade frames apart from the
//! caller. Keep new capture-path code here.
//!
//! The active [`LoggingConfig`] is an immutable snapshot. [`install`] swaps it
//! atomically, so a log call racing with re-initialisation sees either the old
//! or the new configuration, never a mix.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::Level;

use crate::config::{LoggingConfig, DEFAULT_LEVEL};

pub mod emit;
mod format;
mod sink;
pub mod walker;

pub use emit::{emit, emit_fatal, emit_panic, enabled};
pub use walker::{
    capture, capture_with, is_facade_frame, walk_frames, FrameWalk, FACADE_MODULE,
    MAX_WALK_FRAMES,
};

static ACTIVE: Lazy<RwLock<Arc<LoggingConfig>>> =
    Lazy::new(|| RwLock::new(Arc::new(LoggingConfig::default())));

/// Snapshot of the installed configuration.
pub fn active_config() -> Arc<LoggingConfig> {
    ACTIVE.read().clone()
}

/// Install `config` as the active configuration without touching output or level.
///
/// Lambda mode fills in the runtime entry point as stop function here.
pub fn install(config: LoggingConfig) -> Arc<LoggingConfig> {
    let snapshot = Arc::new(config.into_installed());
    *ACTIVE.write() = Arc::clone(&snapshot);
    snapshot
}

/// Initialise with defaults: JSON to standard output at `info`, caller
/// location on, no ancestor trace.
pub fn init() -> Arc<LoggingConfig> {
    sink::install_subscriber();
    sink::use_stdout();
    set_level(DEFAULT_LEVEL);
    install(LoggingConfig::defaults())
}

/// Initialise from `config`.
///
/// An unopenable log file keeps output on standard output and an invalid or
/// missing level falls back to `info`; both are reported as log records.
pub fn init_with_options(mut config: LoggingConfig) -> Arc<LoggingConfig> {
    sink::install_subscriber();

    match config.file() {
        Some(path) => {
            if let Err(err) = sink::use_file(path) {
                sink::use_stdout();
                tracing::warn!(file = %path.display(), error = %err, "unable to open file");
            }
        }
        None => sink::use_stdout(),
    }

    if config.level.is_none() {
        config.level = Some(DEFAULT_LEVEL.to_owned());
        tracing::info!("log level not set using default");
    }
    set_level(config.level());

    install(config)
}

/// Parse a level name. Accepts the `tracing` names plus `warning`, `fatal`
/// and `panic`, ignoring case.
pub fn parse_level(level: &str) -> Option<Level> {
    match level.trim().to_ascii_lowercase().as_str() {
        "fatal" | "panic" => Some(Level::ERROR),
        "warning" => Some(Level::WARN),
        other => other.parse().ok(),
    }
}

/// Apply `level` to the installed subscriber, falling back to `info` when it
/// does not parse. Returns the level in effect.
pub fn set_level(level: &str) -> Level {
    let parsed = parse_level(level).unwrap_or_else(|| {
        tracing::warn!(requested = level, "invalid log level using default");
        Level::INFO
    });
    sink::set_max_level(parsed);
    tracing::info!(
        "logging started at level {}",
        parsed.as_str().to_ascii_lowercase()
    );
    parsed
}
