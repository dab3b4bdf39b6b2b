//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "binary"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Demonstration CLI for caller-aware logging."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use serde_json::Value;
use stacklog::{Fields, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Log through stacklog from a chain of nested calls",
    long_about = None
)]
struct Cli {
    #[arg(long, help = "TOML logging configuration to start from")]
    config: Option<PathBuf>,
    #[arg(long, help = "Minimum level (trace, debug, info, warn, error)")]
    level: Option<String>,
    #[arg(long, help = "Append records to this file instead of stdout")]
    file: Option<PathBuf>,
    #[arg(long, help = "Maximum number of ancestor frames, 0 for unbounded")]
    max_entries: Option<usize>,
    #[arg(long, help = "Stop the trace after this function, e.g. stacklog_demo::main")]
    stop_function: Option<String>,
    #[arg(long, help = "Stop the trace after the first frame in a file with this suffix")]
    stop_file: Option<String>,
    #[arg(long, action = ArgAction::SetTrue, help = "Stop at the lambda runtime entry point")]
    lambda: bool,
    #[arg(long, action = ArgAction::SetTrue, help = "Do not attach caller location")]
    no_location: bool,
    #[arg(long, default_value_t = 3, help = "Number of requests to simulate")]
    requests: u32,
}

impl Cli {
    fn logging_config(&self) -> Result<LoggingConfig> {
        let mut config = match &self.config {
            Some(path) => LoggingConfig::from_path(path)
                .with_context(|| format!("unable to load {}", path.display()))?,
            None => LoggingConfig::defaults(),
        };

        if let Some(level) = &self.level {
            config = config.with_level(level.clone());
        }
        if let Some(file) = &self.file {
            config = config.with_file(file.clone());
        }
        if self.no_location {
            config = config.with_include_location(false);
        }

        let wants_trace = self.max_entries.is_some()
            || self.stop_function.is_some()
            || self.stop_file.is_some()
            || self.lambda;
        if wants_trace {
            let mut stack_trace = config.stack_trace.take().unwrap_or_default();
            if let Some(max_entries) = self.max_entries {
                stack_trace = stack_trace.with_max_entries(max_entries);
            }
            if let Some(stop_function) = &self.stop_function {
                stack_trace = stack_trace.with_stop_function(stop_function.clone());
            }
            if let Some(stop_file) = &self.stop_file {
                stack_trace = stack_trace.with_stop_file(stop_file.clone());
            }
            if self.lambda {
                stack_trace = stack_trace.with_lambda(true);
            }
            config = config.with_stack_trace(stack_trace);
        }
        Ok(config)
    }
}

fn load_account(id: u32) -> Option<&'static str> {
    stacklog::debug!("loading account {}", id);
    (id % 2 == 0).then_some("active")
}

fn handle_request(id: u32) {
    let mut fields = Fields::new();
    fields.insert("request_id".to_owned(), Value::from(id));
    match load_account(id) {
        Some(status) => stacklog::info!(fields = fields, "account status {}", status),
        None => stacklog::warn!(fields = fields, "account {} not found", id),
    }
}

fn serve(requests: u32) {
    for id in 0..requests {
        handle_request(id);
    }
    stacklog::print_log!("served {} requests", requests);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = stacklog::init_with_options(cli.logging_config()?);
    stacklog::info!(
        "demo started with location {}",
        if config.include_location() { "on" } else { "off" }
    );
    serve(cli.requests);
    Ok(())
}
