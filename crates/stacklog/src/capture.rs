//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Caller location and ancestor trace records."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Structured key/value pairs attached to a record.
pub type Fields = Map<String, Value>;

/// Key holding the caller's file.
pub const FILE_KEY: &str = "file";
/// Key holding the caller's line.
pub const LINE_KEY: &str = "line";
/// Key holding the caller's function. Trace entries use `function` instead.
pub const FUNC_KEY: &str = "func";
/// Key holding the ancestor trace.
pub const TRACE_KEY: &str = "trace";

/// Keys owned by the captured location; user fields never override them.
pub const LOCATION_KEYS: [&str; 4] = [FILE_KEY, LINE_KEY, FUNC_KEY, TRACE_KEY];

/// One entry of the call stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Source file path as reported by the debug information.
    pub file: String,
    /// Line number, `0` when unknown.
    pub line: u32,
    /// Demangled function path without the symbol hash.
    pub function: String,
}

impl Frame {
    /// Construct a frame.
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    fn to_value(&self) -> Value {
        json!({
            "file": self.file,
            "line": self.line,
            "function": self.function,
        })
    }
}

/// Outcome of one frame walk.
///
/// `caller` is `None` only when location capture is disabled. `trace` is
/// `None` unless a stack trace config was active and at least one ancestor
/// frame was collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureResult {
    /// The first frame outside the logging facade.
    pub caller: Option<Frame>,
    /// Frames above the caller, innermost first.
    pub trace: Option<Vec<Frame>>,
}

impl CaptureResult {
    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.caller.is_none() && self.trace.is_none()
    }

    /// Caller file, `""` when not captured.
    pub fn file(&self) -> &str {
        self.caller.as_ref().map(|c| c.file.as_str()).unwrap_or_default()
    }

    /// Caller line, `0` when not captured.
    pub fn line(&self) -> u32 {
        self.caller.as_ref().map(|c| c.line).unwrap_or_default()
    }

    /// Caller function, `""` when not captured.
    pub fn function(&self) -> &str {
        self.caller
            .as_ref()
            .map(|c| c.function.as_str())
            .unwrap_or_default()
    }

    /// Ancestor frames, empty when no trace was collected.
    pub fn trace(&self) -> &[Frame] {
        self.trace.as_deref().unwrap_or_default()
    }

    /// Render as record fields: `file`, `line`, `func` and, when present, `trace`.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        if let Some(caller) = &self.caller {
            fields.insert(FILE_KEY.to_owned(), Value::from(caller.file.as_str()));
            fields.insert(LINE_KEY.to_owned(), Value::from(caller.line));
            fields.insert(FUNC_KEY.to_owned(), Value::from(caller.function.as_str()));
        }
        if let Some(trace) = &self.trace {
            fields.insert(
                TRACE_KEY.to_owned(),
                Value::Array(trace.iter().map(Frame::to_value).collect()),
            );
        }
        fields
    }

    /// Merge the captured location into user supplied fields, replacing
    /// any user values stored under the location keys.
    pub fn merge_into(&self, fields: &mut Fields) {
        fields.extend(self.to_fields());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CaptureResult {
        CaptureResult {
            caller: Some(Frame::new("src/service.rs", 42, "app::service::handle")),
            trace: Some(vec![Frame::new("src/main.rs", 7, "app::main")]),
        }
    }

    #[test]
    fn empty_result_renders_no_fields() {
        let result = CaptureResult::default();
        assert!(result.is_empty());
        assert!(result.to_fields().is_empty());
        assert_eq!(result.file(), "");
        assert_eq!(result.line(), 0);
        assert_eq!(result.function(), "");
        assert!(result.trace().is_empty());
    }

    #[test]
    fn primary_location_uses_func_key() {
        let fields = sample().to_fields();
        assert_eq!(fields["file"], "src/service.rs");
        assert_eq!(fields["line"], 42);
        assert_eq!(fields["func"], "app::service::handle");
        assert!(fields.get("function").is_none());
    }

    #[test]
    fn trace_entries_use_function_key() {
        let fields = sample().to_fields();
        let trace = fields["trace"].as_array().expect("trace is an array");
        assert_eq!(trace.len(), 1);
        assert_eq!(trace[0]["function"], "app::main");
        assert_eq!(trace[0]["line"], 7);
        assert!(trace[0].get("func").is_none());
    }

    #[test]
    fn trace_key_absent_without_trace() {
        let result = CaptureResult {
            caller: Some(Frame::new("src/lib.rs", 1, "app::run")),
            trace: None,
        };
        assert!(!result.to_fields().contains_key("trace"));
    }

    #[test]
    fn merge_overrides_user_location_keys() {
        let mut fields = Fields::new();
        fields.insert("file".to_owned(), Value::from("user supplied"));
        fields.insert("request_id".to_owned(), Value::from("abc"));
        sample().merge_into(&mut fields);
        assert_eq!(fields["file"], "src/service.rs");
        assert_eq!(fields["request_id"], "abc");
    }
}
