//! Tracing infrastructure
//!
//! Structured logging for the compiler and CLI, built on `tracing` and
//! `tracing-subscriber`:
//! - Multiple output formats (pretty, compact, JSON)
//! - `RUST_LOG` filtering, falling back to the configured level
//! - Integration with [`CompilerConfig`]
//!
//! # Example
//! ```no_run
//! use workflow_compiler::{config::CompilerConfig, tracing_setup};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CompilerConfig::load()?;
//! tracing_setup::init_from_config(&config)?;
//! tracing::info!("Compiler started");
//! # Ok(())
//! # }
//! ```

use crate::config::CompilerConfig;
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Output format for tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Multi-line events, colored when stderr is a terminal
    Pretty,
    /// One line per event without colors
    Compact,
    /// JSON format for log aggregation
    Json,
}

/// Level and format the subscriber is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Fallback level when `RUST_LOG` is unset
    pub level: Level,
    /// Output format
    pub format: OutputFormat,
}

impl TracingConfig {
    /// Read level and format from the `[application]` section
    pub fn from_compiler_config(config: &CompilerConfig) -> Result<Self, String> {
        Ok(Self {
            level: parse_log_level(&config.application.log_level)?,
            format: parse_output_format(&config.application.log_format)?,
        })
    }
}

/// Initialize tracing from the compiler configuration
pub fn init_from_config(config: &CompilerConfig) -> Result<(), String> {
    init(TracingConfig::from_compiler_config(config)?)
}

/// Install the global subscriber
///
/// Idempotent: if a global subscriber is already set, returns `Ok(())`.
/// Logs go to stderr so compiled documents can be piped from stdout.
pub fn init(config: TracingConfig) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string().to_lowercase()));

    let base = fmt::layer().with_writer(std::io::stderr);
    let layer = match config.format {
        OutputFormat::Pretty => base
            .pretty()
            .with_ansi(std::io::stderr().is_terminal())
            .boxed(),
        OutputFormat::Compact => base.compact().with_ansi(false).boxed(),
        OutputFormat::Json => base.json().with_ansi(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter))
        .try_init()
        .or_else(|e| {
            // A host or test harness may own the global subscriber
            if e.to_string().contains("already") {
                Ok(())
            } else {
                Err(format!("Failed to initialize tracing: {}", e))
            }
        })
}

/// Parse log level string into tracing Level
pub fn parse_log_level(level: &str) -> Result<Level, String> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )),
    }
}

/// Parse output format string
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "pretty" => Ok(OutputFormat::Pretty),
        "compact" => Ok(OutputFormat::Compact),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!(
            "Invalid log format '{}'. Must be one of: pretty, compact, json",
            format
        )),
    }
}
