//! ---
//! ems_section: "03-persistence-logging"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Level macros that attach the calling location."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Each macro takes `format!` style arguments, optionally preceded by
//! `fields = <Fields>,` to attach extra structured data. The level is checked
//! before any argument is evaluated, so costly arguments are free when the
//! level is disabled.

/// Emit a trace record enriched with the caller's location.
#[macro_export]
macro_rules! trace {
    (fields = $fields:expr, $($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::TRACE) {
            $crate::logger::emit($crate::Level::TRACE, Some($fields), format_args!($($arg)+))
        }
    };
    ($($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::TRACE) {
            $crate::logger::emit($crate::Level::TRACE, None, format_args!($($arg)+))
        }
    };
}

/// Emit a debug record enriched with the caller's location.
#[macro_export]
macro_rules! debug {
    (fields = $fields:expr, $($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::DEBUG) {
            $crate::logger::emit($crate::Level::DEBUG, Some($fields), format_args!($($arg)+))
        }
    };
    ($($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::DEBUG) {
            $crate::logger::emit($crate::Level::DEBUG, None, format_args!($($arg)+))
        }
    };
}

/// Emit an informational record enriched with the caller's location.
#[macro_export]
macro_rules! info {
    (fields = $fields:expr, $($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::INFO) {
            $crate::logger::emit($crate::Level::INFO, Some($fields), format_args!($($arg)+))
        }
    };
    ($($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::INFO) {
            $crate::logger::emit($crate::Level::INFO, None, format_args!($($arg)+))
        }
    };
}

/// Alias of [`info!`](crate::info) for plain progress output.
#[macro_export]
macro_rules! print_log {
    (fields = $fields:expr, $($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::INFO) {
            $crate::logger::emit($crate::Level::INFO, Some($fields), format_args!($($arg)+))
        }
    };
    ($($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::INFO) {
            $crate::logger::emit($crate::Level::INFO, None, format_args!($($arg)+))
        }
    };
}

/// Emit a warning record enriched with the caller's location.
#[macro_export]
macro_rules! warn {
    (fields = $fields:expr, $($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::WARN) {
            $crate::logger::emit($crate::Level::WARN, Some($fields), format_args!($($arg)+))
        }
    };
    ($($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::WARN) {
            $crate::logger::emit($crate::Level::WARN, None, format_args!($($arg)+))
        }
    };
}

/// Emit an error record enriched with the caller's location.
#[macro_export]
macro_rules! error {
    (fields = $fields:expr, $($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::ERROR) {
            $crate::logger::emit($crate::Level::ERROR, Some($fields), format_args!($($arg)+))
        }
    };
    ($($arg:tt)+) => {
        if $crate::logger::enabled($crate::Level::ERROR) {
            $crate::logger::emit($crate::Level::ERROR, None, format_args!($($arg)+))
        }
    };
}

/// Emit an error record marked `fatal`, then exit the process with status 1.
#[macro_export]
macro_rules! fatal {
    (fields = $fields:expr, $($arg:tt)+) => {
        $crate::logger::emit_fatal(Some($fields), format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::logger::emit_fatal(None, format_args!($($arg)+))
    };
}

/// Emit an error record marked `panic`, then panic with the same message.
#[macro_export]
macro_rules! panic_log {
    (fields = $fields:expr, $($arg:tt)+) => {
        $crate::logger::emit_panic(Some($fields), format_args!($($arg)+))
    };
    ($($arg:tt)+) => {
        $crate::logger::emit_panic(None, format_args!($($arg)+))
    };
}
