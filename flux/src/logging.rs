//! Structured logging setup, wired the way `sloggers` expects: build a
//! `LoggerConfig` (terminal or file sink) and turn it into a root `slog::Logger`.

use slog::Logger;
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::file::FileLoggerBuilder;
use sloggers::Build;

/// Where the root logger writes to.
#[derive(Debug, Clone)]
pub enum Sink {
    /// Human-readable output on stderr.
    Terminal,
    /// Append to the given file path (used for `-l` / daemon mode).
    File(String),
}

/// Logging configuration derived from the `-e <0..9>` and `-l` CLI flags (spec.md §6).
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub sink: Sink,
    pub debug_level: u8,
}

impl LogConfig {
    /// Maps the proxy server's four-tier debug level (0=errors, 1=warnings,
    /// 2=informational, 9=full) onto `slog::Level`, matching `Log::sDebugLevel`
    /// in the original implementation.
    fn severity(&self) -> Severity {
        match self.debug_level {
            0 => Severity::Error,
            1 => Severity::Warning,
            2..=8 => Severity::Info,
            _ => Severity::Trace,
        }
    }
}

/// Builds the root logger for the process. Every long-lived component
/// (`Relay`, `Transport` impls, the CLI shell) derives a child logger from
/// this one via `logger.new(slog::o!(...))`.
pub fn init(config: &LogConfig) -> Logger {
    match &config.sink {
        Sink::Terminal => {
            let mut builder = TerminalLoggerBuilder::new();
            builder.level(config.severity());
            builder.destination(Destination::Stderr);
            builder
                .build()
                .expect("failed to build terminal logger")
        }
        Sink::File(path) => {
            let mut builder = FileLoggerBuilder::new(path);
            builder.level(config.severity());
            builder
                .build()
                .expect("failed to build file logger")
        }
    }
}
