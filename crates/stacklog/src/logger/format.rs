//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "JSON record layout with structured trace and user fields."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! One JSON object per line.
//!
//! `tracing` field values are flat, so the emitter hands the ancestor trace
//! and the user's fields over as pre-serialised JSON under the internal
//! [`TRACE_FIELD`] and [`USER_FIELDS_FIELD`] names. The formatter decodes
//! them: the trace lands under `trace` as an array and user keys are merged
//! into the top level without replacing keys the record already carries.

use std::fmt;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::capture::{Fields, TRACE_KEY};

/// Event field carrying the serialised ancestor trace.
pub(crate) const TRACE_FIELD: &str = "stacklog.trace";
/// Event field carrying the serialised user fields.
pub(crate) const USER_FIELDS_FIELD: &str = "stacklog.fields";

const TIMESTAMP_KEY: &str = "timestamp";
const LEVEL_KEY: &str = "level";

/// Event formatter writing flat JSON records.
#[derive(Debug, Clone)]
pub(crate) struct RecordFormat<T> {
    timer: T,
}

impl<T> RecordFormat<T> {
    pub(crate) fn new(timer: T) -> Self {
        Self { timer }
    }
}

impl<S, N, T> FormatEvent<S, N> for RecordFormat<T>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    T: FormatTime,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut record = Fields::new();

        let mut timestamp = String::new();
        if self.timer.format_time(&mut Writer::new(&mut timestamp)).is_ok() {
            record.insert(TIMESTAMP_KEY.to_owned(), Value::from(timestamp));
        }
        record.insert(
            LEVEL_KEY.to_owned(),
            Value::from(event.metadata().level().as_str()),
        );

        let mut visitor = RecordVisitor {
            record: &mut record,
            user_fields: None,
        };
        event.record(&mut visitor);
        let user_fields = visitor.user_fields.take();
        if let Some(user_fields) = user_fields {
            merge_user_fields(&mut record, user_fields);
        }

        writeln!(writer, "{}", Value::Object(record))
    }
}

/// Add `user_fields` to `record`, keeping values the record already has.
pub(crate) fn merge_user_fields(record: &mut Fields, user_fields: Fields) {
    for (key, value) in user_fields {
        record.entry(key).or_insert(value);
    }
}

struct RecordVisitor<'a> {
    record: &'a mut Fields,
    user_fields: Option<Fields>,
}

impl RecordVisitor<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        self.record.insert(field.name().to_owned(), value);
    }
}

impl Visit for RecordVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            TRACE_FIELD => {
                let trace = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
                self.record.insert(TRACE_KEY.to_owned(), trace);
            }
            USER_FIELDS_FIELD => {
                if let Ok(Value::Object(fields)) = serde_json::from_str(value) {
                    self.user_fields = Some(fields);
                }
            }
            _ => self.insert(field, Value::from(value)),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}
