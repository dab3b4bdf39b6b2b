//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Call stack walk that locates the caller and collects ancestor frames."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Frame walker.
//!
//! A walk consumes frames innermost first. Frames from the facade itself are
//! skipped, the first frame past them is the caller, and when a stack trace
//! config is active the following frames are collected until a stop
//! condition fires or the stack runs out.
//!
//! Facade frames are recognised by their parent directory: every function on
//! the capture path lives in this `logger/` directory.

use std::borrow::Cow;

use crate::capture::{CaptureResult, Frame};
use crate::config::{LoggingConfig, StackTraceConfig};

/// Directory name that marks a frame as belonging to the facade.
pub const FACADE_MODULE: &str = "logger";

/// Hard bound on frames visited per walk.
pub const MAX_WALK_FRAMES: usize = 500;

fn normalize_separators(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Whether `file` lives directly inside the facade's `logger` directory.
///
/// Paths with fewer than two segments are never facade frames.
pub fn is_facade_frame(file: &str) -> bool {
    let file = normalize_separators(file);
    let mut segments = file.rsplit('/');
    segments.next();
    segments.next() == Some(FACADE_MODULE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Skipping,
    Tracing,
    Done,
}

/// Incremental frame walk.
///
/// Feed frames with [`FrameWalk::push`] until it returns `false`, then call
/// [`FrameWalk::finish`].
#[derive(Debug)]
pub struct FrameWalk<'a> {
    stack_trace: Option<&'a StackTraceConfig>,
    phase: Phase,
    visited: usize,
    caller: Option<Frame>,
    trace: Vec<Frame>,
}

impl<'a> FrameWalk<'a> {
    /// Start a walk for the given configuration.
    pub fn new(config: &'a LoggingConfig) -> Self {
        Self {
            stack_trace: config.stack_trace(),
            phase: Phase::Skipping,
            visited: 0,
            caller: None,
            trace: Vec::new(),
        }
    }

    /// Whether the walk has stopped accepting frames.
    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Consume the next frame. Returns `false` once no further frames are needed.
    pub fn push(&mut self, frame: Frame) -> bool {
        if self.is_done() {
            return false;
        }
        if self.visited >= MAX_WALK_FRAMES {
            self.phase = Phase::Done;
            return false;
        }
        self.visited += 1;

        if !is_facade_frame(&frame.file) {
            match (self.phase, self.stack_trace) {
                (Phase::Skipping, Some(_)) => {
                    self.caller = Some(frame);
                    self.phase = Phase::Tracing;
                }
                (Phase::Skipping, None) => {
                    self.caller = Some(frame);
                    self.phase = Phase::Done;
                }
                (Phase::Tracing, Some(stack_trace)) => {
                    self.trace.push(frame);
                    if reached_stop(stack_trace, &self.trace) {
                        self.phase = Phase::Done;
                    }
                }
                _ => self.phase = Phase::Done,
            }
        }

        !self.is_done() && self.visited < MAX_WALK_FRAMES
    }

    /// Assemble the capture result.
    pub fn finish(self) -> CaptureResult {
        CaptureResult {
            caller: Some(self.caller.unwrap_or_default()),
            trace: (!self.trace.is_empty()).then_some(self.trace),
        }
    }
}

/// Stop conditions, checked after `trace`'s last frame was appended.
fn reached_stop(config: &StackTraceConfig, trace: &[Frame]) -> bool {
    let Some(frame) = trace.last() else {
        return false;
    };

    let max_entries = config.max_entries();
    if max_entries > 0 && trace.len() == max_entries {
        return true;
    }

    let stop_function = config.stop_function();
    if !stop_function.is_empty() && frame.function == stop_function {
        return true;
    }

    let stop_file = config.stop_file();
    if !stop_file.is_empty() {
        let suffix = normalize_separators(stop_file);
        if normalize_separators(&frame.file).ends_with(&*suffix) {
            return true;
        }
    }

    config.lambda() && !stop_function.is_empty() && frame.function.starts_with(stop_function)
}

/// Walk an already materialised frame sequence, innermost first.
pub fn walk_frames<I>(config: &LoggingConfig, frames: I) -> CaptureResult
where
    I: IntoIterator<Item = Frame>,
{
    if !config.include_location() {
        return CaptureResult::default();
    }
    let mut walk = FrameWalk::new(config);
    for frame in frames {
        if !walk.push(frame) {
            break;
        }
    }
    walk.finish()
}

fn resolve_symbol(symbol: &backtrace::Symbol) -> Option<Frame> {
    let function = symbol.name().map(|name| format!("{name:#}"));
    let file = symbol
        .filename()
        .map(|path| path.to_string_lossy().into_owned());
    if function.is_none() && file.is_none() {
        return None;
    }
    Some(Frame {
        file: file.unwrap_or_default(),
        line: symbol.lineno().unwrap_or_default(),
        function: function.unwrap_or_default(),
    })
}

/// Capture the caller of the facade using an explicitly passed configuration.
///
/// Frames belonging to the unwinder are dropped until the first facade frame
/// (this function) is reached; the walk starts there.
#[inline(never)]
pub fn capture_with(config: &LoggingConfig) -> CaptureResult {
    if !config.include_location() {
        return CaptureResult::default();
    }

    let mut walk = FrameWalk::new(config);
    let mut entered = false;
    backtrace::trace(|raw| {
        let mut keep_going = true;
        backtrace::resolve_frame(raw, |symbol| {
            if !keep_going {
                return;
            }
            let Some(frame) = resolve_symbol(symbol) else {
                return;
            };
            if !entered {
                if !is_facade_frame(&frame.file) {
                    return;
                }
                entered = true;
            }
            keep_going = walk.push(frame);
        });
        keep_going
    });
    walk.finish()
}

/// Capture the caller of the facade using the installed configuration.
#[inline(never)]
pub fn capture() -> CaptureResult {
    let config = super::active_config();
    capture_with(&config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LAMBDA_ENTRY_POINT;

    fn facade(function: &str) -> Frame {
        Frame::new("crates/stacklog/src/logger/emit.rs", 30, function)
    }

    fn app(n: u32) -> Frame {
        Frame::new(format!("app/src/layer{n}.rs"), n, format!("app::layer{n}"))
    }

    /// Two facade frames, the caller `app::layer0`, then `ancestors` frames.
    fn stack(ancestors: u32) -> Vec<Frame> {
        let mut frames = vec![
            facade("stacklog::logger::walker::capture"),
            facade("stacklog::logger::emit::emit"),
        ];
        frames.extend((0..=ancestors).map(app));
        frames
    }

    fn enabled() -> LoggingConfig {
        LoggingConfig::new().with_include_location(true)
    }

    fn traced(stack_trace: StackTraceConfig) -> LoggingConfig {
        enabled().with_stack_trace(stack_trace).into_installed()
    }

    fn functions(result: &CaptureResult) -> Vec<&str> {
        result.trace().iter().map(|f| f.function.as_str()).collect()
    }

    #[test]
    fn facade_frames_detected_by_parent_directory() {
        assert!(is_facade_frame("/src/stacklog/src/logger/walker.rs"));
        assert!(is_facade_frame("logger/emit.rs"));
        assert!(is_facade_frame(r"C:\work\stacklog\src\logger\sink.rs"));
        assert!(!is_facade_frame("/src/logger/nested/walker.rs"));
        assert!(!is_facade_frame("/src/app/logger.rs"));
        assert!(!is_facade_frame("walker.rs"));
        assert!(!is_facade_frame(""));
    }

    #[test]
    fn disabled_location_yields_empty_result() {
        let config = LoggingConfig::new()
            .with_include_location(false)
            .with_stack_trace(StackTraceConfig::new());
        let result = walk_frames(&config, stack(5));
        assert!(result.is_empty());
    }

    #[test]
    fn caller_without_trace_config() {
        let result = walk_frames(&enabled(), stack(5));
        let caller = result.caller.as_ref().expect("location enabled");
        assert_eq!(caller, &app(0));
        assert!(result.trace.is_none());
    }

    #[test]
    fn empty_trace_config_walks_to_exhaustion() {
        let result = walk_frames(&traced(StackTraceConfig::new()), stack(4));
        assert_eq!(result.function(), "app::layer0");
        assert_eq!(
            functions(&result),
            ["app::layer1", "app::layer2", "app::layer3", "app::layer4"]
        );
    }

    #[test]
    fn max_entries_truncates_innermost_first() {
        let config = traced(StackTraceConfig::new().with_max_entries(3));
        let result = walk_frames(&config, stack(6));
        assert_eq!(
            functions(&result),
            ["app::layer1", "app::layer2", "app::layer3"]
        );
    }

    #[test]
    fn zero_max_entries_is_unbounded() {
        let config = traced(StackTraceConfig::new().with_max_entries(0));
        let result = walk_frames(&config, stack(6));
        assert_eq!(result.trace().len(), 6);
    }

    #[test]
    fn stop_function_is_last_entry() {
        let config = traced(StackTraceConfig::new().with_stop_function("app::layer2"));
        let result = walk_frames(&config, stack(6));
        assert_eq!(functions(&result), ["app::layer1", "app::layer2"]);
    }

    #[test]
    fn stop_function_requires_exact_match_outside_lambda_mode() {
        let config = traced(StackTraceConfig::new().with_stop_function("app::layer"));
        let result = walk_frames(&config, stack(3));
        assert_eq!(result.trace().len(), 3);
    }

    #[test]
    fn stop_file_matches_suffix() {
        let config = traced(StackTraceConfig::new().with_stop_file("layer3.rs"));
        let result = walk_frames(&config, stack(6));
        assert_eq!(result.trace().last().unwrap().file, "app/src/layer3.rs");
        assert_eq!(result.trace().len(), 3);
    }

    #[test]
    fn stop_file_normalizes_separators() {
        let mut frames = stack(1);
        frames.push(Frame::new(r"C:\app\src\main.rs", 3, "app::main"));
        frames.push(app(9));
        let config = traced(StackTraceConfig::new().with_stop_file("src/main.rs"));
        let result = walk_frames(&config, frames);
        assert_eq!(functions(&result), ["app::layer1", "app::main"]);
    }

    #[test]
    fn lambda_mode_stops_at_runtime_prefix() {
        let mut frames = stack(2);
        frames.push(Frame::new(
            "/registry/lambda_runtime/src/lib.rs",
            120,
            format!("{LAMBDA_ENTRY_POINT}::{{{{closure}}}}"),
        ));
        frames.push(Frame::new("/rustc/library/std/src/rt.rs", 10, "std::rt::lang_start"));
        let config = traced(StackTraceConfig::new().with_lambda(true));
        let result = walk_frames(&config, frames);
        assert_eq!(result.trace().len(), 3);
        assert!(result.trace()[2].function.starts_with(LAMBDA_ENTRY_POINT));
    }

    #[test]
    fn lambda_mode_prefix_uses_explicit_stop_function() {
        let config = traced(
            StackTraceConfig::new()
                .with_lambda(true)
                .with_stop_function("app::layer"),
        );
        let result = walk_frames(&config, stack(4));
        assert_eq!(functions(&result), ["app::layer1"]);
    }

    #[test]
    fn stop_conditions_checked_in_order() {
        let config = traced(
            StackTraceConfig::new()
                .with_max_entries(2)
                .with_stop_function("app::layer4"),
        );
        let result = walk_frames(&config, stack(6));
        assert_eq!(functions(&result), ["app::layer1", "app::layer2"]);
    }

    #[test]
    fn facade_frames_never_traced() {
        let mut frames = stack(1);
        frames.push(facade("stacklog::logger::emit::emit"));
        frames.push(app(2));
        let result = walk_frames(&traced(StackTraceConfig::new()), frames);
        assert_eq!(result.function(), "app::layer0");
        assert_eq!(functions(&result), ["app::layer1", "app::layer2"]);
    }

    #[test]
    fn facade_only_stack_yields_blank_caller() {
        let frames = vec![facade("stacklog::logger::emit::emit")];
        let result = walk_frames(&enabled(), frames);
        assert_eq!(result.caller, Some(Frame::default()));
        assert!(result.trace.is_none());
    }

    #[test]
    fn empty_stack_yields_blank_caller() {
        let result = walk_frames(&traced(StackTraceConfig::new()), Vec::new());
        assert_eq!(result.caller, Some(Frame::default()));
        assert!(result.trace.is_none());
    }

    #[test]
    fn safety_bound_truncates_runaway_stacks() {
        let frames = std::iter::repeat(app(1));
        let result = walk_frames(&traced(StackTraceConfig::new()), frames);
        assert_eq!(result.trace().len(), MAX_WALK_FRAMES - 1);
    }

    #[test]
    fn safety_bound_counts_skipped_frames() {
        let frames = std::iter::repeat(facade("stacklog::logger::emit::emit"));
        let result = walk_frames(&enabled(), frames);
        assert_eq!(result.caller, Some(Frame::default()));
    }

    #[test]
    fn push_reports_completion() {
        let config = enabled();
        let mut walk = FrameWalk::new(&config);
        assert!(walk.push(facade("stacklog::logger::walker::capture")));
        assert!(!walk.push(app(0)));
        assert!(walk.is_done());
        assert!(!walk.push(app(1)));
        assert_eq!(walk.finish().function(), "app::layer0");
    }

    #[test]
    fn walks_are_idempotent() {
        let config = traced(StackTraceConfig::new().with_max_entries(4));
        assert_eq!(walk_frames(&config, stack(6)), walk_frames(&config, stack(6)));
    }
}
