//! Stderr logger for the `log` facade
//!
//! Levels come from `-v` flags or from a `RUST_LOG`-style directive list
//! such as `warn,parser=debug,interpreter::eval=trace`, read from
//! [`LOG_ENV`] first and [`RUST_LOG_ENV`] second.

use std::io::Write;
use std::str::FromStr;
use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Environment variable holding log directives
pub const LOG_ENV: &str = "DUCT_LOG";

/// Fallback directive variable
pub const RUST_LOG_ENV: &str = "RUST_LOG";

/// Per-target log levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    targets: Vec<(String, LevelFilter)>,
}

impl LogFilter {
    /// Filter passing `level` for every target
    pub fn new(level: LevelFilter) -> Self {
        Self {
            default: level,
            targets: Vec::new(),
        }
    }

    /// Parse comma-separated directives: `level` or `target=level`
    ///
    /// Unparseable directives are skipped. The last bare level wins.
    pub fn parse(directives: &str) -> Self {
        let mut filter = Self::new(LevelFilter::Warn);
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.split_once('=') {
                Some((target, level)) => {
                    if let Ok(level) = LevelFilter::from_str(level.trim()) {
                        filter.targets.push((target.trim().to_string(), level));
                    }
                }
                None => {
                    if let Ok(level) = LevelFilter::from_str(directive) {
                        filter.default = level;
                    }
                }
            }
        }
        // Longest prefix first
        filter.targets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        filter
    }

    /// Replace the level used for targets without a directive
    pub fn with_default(mut self, level: LevelFilter) -> Self {
        self.default = level;
        self
    }

    /// Level applied to records of `target`
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(prefix, _)| {
                target == prefix.as_str()
                    || target
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
            .map(|(_, level)| *level)
            .unwrap_or(self.default)
    }

    /// Most verbose level any target may log at
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, Ord::max)
    }

    fn enabled(&self, level: Level, target: &str) -> bool {
        level <= self.level_for(target)
    }
}

impl Default for LogFilter {
    fn default() -> Self {
        Self::new(LevelFilter::Warn)
    }
}

/// Filter for a `-v` count and the directive variables
///
/// `-v` flags raise the default level; target directives from the
/// environment still apply. Without either, only warnings are shown.
pub fn filter_for(verbosity: u8, duct_log: Option<&str>, rust_log: Option<&str>) -> LogFilter {
    let filter = duct_log
        .or(rust_log)
        .map(LogFilter::parse)
        .unwrap_or_default();
    match verbosity {
        0 => filter,
        1 => filter.with_default(LevelFilter::Info),
        2 => filter.with_default(LevelFilter::Debug),
        _ => filter.with_default(LevelFilter::Trace),
    }
}

/// Filter built from the process environment
pub fn filter_from_env(verbosity: u8) -> LogFilter {
    let duct_log = std::env::var(LOG_ENV).ok();
    let rust_log = std::env::var(RUST_LOG_ENV).ok();
    filter_for(verbosity, duct_log.as_deref(), rust_log.as_deref())
}

/// Writes every enabled record to stderr
#[derive(Debug)]
pub struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;
static FILTER: OnceLock<LogFilter> = OnceLock::new();

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        match FILTER.get() {
            Some(filter) => filter.enabled(metadata.level(), metadata.target()),
            None => metadata.level() <= log::max_level(),
        }
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the stderr logger
///
/// Fails if another logger was installed first.
pub fn init(filter: LogFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(filter.max_level());
    let _ = FILTER.set(filter);
    Ok(())
}
