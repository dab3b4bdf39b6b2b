//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Subscriber installation and swappable output sink."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::io::{self, Write};
use std::path::Path;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

use super::format::RecordFormat;

enum Sink {
    Stdout,
    File(RollingFileAppender),
}

static SINK: Lazy<Mutex<Sink>> = Lazy::new(|| Mutex::new(Sink::Stdout));
static LEVEL_HANDLE: OnceCell<reload::Handle<LevelFilter, Registry>> = OnceCell::new();

/// Writes each formatted record to whichever sink is active.
#[derive(Debug, Default, Clone, Copy)]
struct SinkWriter;

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *SINK.lock() {
            Sink::Stdout => io::stdout().lock().write_all(buf)?,
            Sink::File(appender) => appender.write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *SINK.lock() {
            Sink::Stdout => io::stdout().flush(),
            Sink::File(appender) => appender.flush(),
        }
    }
}

/// Install the JSON subscriber once per process. Later calls are no-ops.
///
/// When another global subscriber is already set, records flow to it and
/// level changes made here only affect the facade's early level check.
pub(crate) fn install_subscriber() {
    LEVEL_HANDLE.get_or_init(|| {
        let (filter, handle) = reload::Layer::new(LevelFilter::INFO);
        let record_layer = fmt::layer()
            .event_format(RecordFormat::new(fmt::time::UtcTime::rfc_3339()))
            .with_writer(SinkWriter::default);

        tracing_subscriber::registry()
            .with(filter)
            .with(record_layer)
            .try_init()
            .ok();
        handle
    });
}

pub(crate) fn set_max_level(level: Level) {
    if let Some(handle) = LEVEL_HANDLE.get() {
        if let Err(err) = handle.reload(LevelFilter::from_level(level)) {
            tracing::warn!(requested = %level, error = %err, "unable to apply log level");
        }
    }
}

pub(crate) fn use_stdout() {
    *SINK.lock() = Sink::Stdout;
}

/// Route records to `path`, creating it if needed and appending otherwise.
pub(crate) fn use_file(path: &Path) -> io::Result<()> {
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("log path {} has no file name", path.display()),
            )
        })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .map_err(io::Error::other)?;
    *SINK.lock() = Sink::File(appender);
    Ok(())
}

pub(crate) fn flush() {
    if let Err(err) = SinkWriter.flush() {
        tracing::warn!(error = %err, "unable to flush log output");
    }
}
