//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Record emission with captured caller context."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::fmt;

use serde_json::Value;
use tracing::level_filters::LevelFilter;
use tracing::Level;

use super::{sink, walker};
use crate::capture::{CaptureResult, Fields, LOCATION_KEYS, TRACE_KEY};

macro_rules! event_at {
    ($level:expr, $($fields:tt)+) => {
        match $level {
            Level::TRACE => tracing::event!(Level::TRACE, $($fields)+),
            Level::DEBUG => tracing::event!(Level::DEBUG, $($fields)+),
            Level::INFO => tracing::event!(Level::INFO, $($fields)+),
            Level::WARN => tracing::event!(Level::WARN, $($fields)+),
            _ => tracing::event!(Level::ERROR, $($fields)+),
        }
    };
}

/// Terminal behaviour flagged on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    Fatal,
    Panic,
}

fn dispatch(
    level: Level,
    captured: &CaptureResult,
    fields: Option<Fields>,
    outcome: Outcome,
    message: fmt::Arguments<'_>,
) {
    let caller = captured.caller.as_ref();
    let file = caller.map(|c| c.file.as_str());
    let line = caller.map(|c| c.line);
    let func = caller.map(|c| c.function.as_str());
    let trace = captured
        .to_fields()
        .get(TRACE_KEY)
        .map(Value::to_string);
    let extra = fields
        .map(|mut fields| {
            for key in LOCATION_KEYS {
                fields.remove(key);
            }
            fields
        })
        .filter(|fields| !fields.is_empty())
        .map(|fields| Value::Object(fields).to_string());
    let fatal = (outcome == Outcome::Fatal).then_some(true);
    let panic = (outcome == Outcome::Panic).then_some(true);

    // Field names must match format::TRACE_FIELD and format::USER_FIELDS_FIELD.
    event_at!(
        level,
        file = file,
        line = line,
        func = func,
        stacklog.trace = trace.as_deref(),
        stacklog.fields = extra.as_deref(),
        fatal = fatal,
        panic = panic,
        "{}",
        message
    );
}

/// Emit one record at `level` with the caller's location attached.
///
/// Nothing is captured when `level` is disabled. The level macros check the
/// level before evaluating their arguments as well.
#[inline(never)]
pub fn emit(level: Level, fields: Option<Fields>, message: fmt::Arguments<'_>) {
    if !enabled(level) {
        return;
    }
    let captured = walker::capture();
    dispatch(level, &captured, fields, Outcome::Continue, message);
}

/// Whether records at `level` currently pass the installed level.
#[inline]
pub fn enabled(level: Level) -> bool {
    level <= LevelFilter::current()
}

/// Emit an error record flagged `fatal`, flush the sink and exit with status 1.
#[inline(never)]
pub fn emit_fatal(fields: Option<Fields>, message: fmt::Arguments<'_>) -> ! {
    let captured = walker::capture();
    dispatch(Level::ERROR, &captured, fields, Outcome::Fatal, message);
    sink::flush();
    std::process::exit(1)
}

/// Emit an error record flagged `panic`, flush the sink and panic with the
/// same message.
#[inline(never)]
#[track_caller]
pub fn emit_panic(fields: Option<Fields>, message: fmt::Arguments<'_>) -> ! {
    let captured = walker::capture();
    dispatch(Level::ERROR, &captured, fields, Outcome::Panic, message);
    sink::flush();
    panic!("{message}")
}
