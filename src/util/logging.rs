//! Structured logging setup for buildsmith
//!
//! Logging goes through the `tracing` ecosystem. Output is written to stderr so
//! that a generated build script printed on stdout can be piped safely.
//!
//! # Example
//!
//! ```no_run
//! use buildsmith::util::logging;
//!
//! // Honors BUILDSMITH_LOG_LEVEL, BUILDSMITH_LOG_JSON and RUST_LOG
//! logging::init_from_env();
//!
//! tracing::info!(platform = "python", "Platform detected");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

const NOISY_DEPENDENCIES: &[&str] = &["h2=warn", "hyper=warn", "hyper_util=warn", "reqwest=warn"];

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for buildsmith's own targets
    pub level: Level,

    /// Emit JSON lines instead of human readable output
    pub use_json: bool,

    /// Include the module target (e.g. buildsmith::orchestrator)
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,

    /// Include thread ids and names, useful with parallel detection
    pub include_thread_ids: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
            include_thread_ids: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// Configuration for build servers: JSON with full metadata
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            use_json: true,
            include_target: true,
            include_location: true,
            include_thread_ids: true,
        }
    }

    /// Picks the level from CLI flags, falling back to `BUILDSMITH_LOG_LEVEL`
    ///
    /// An explicit `--log-level` wins over `--verbose` and `--quiet`.
    pub fn from_cli(log_level: Option<&str>, verbose: bool, quiet: bool) -> Self {
        let level = match log_level {
            Some(level_str) => parse_level(level_str),
            None if verbose => Level::DEBUG,
            None if quiet => Level::ERROR,
            None => env::var("BUILDSMITH_LOG_LEVEL")
                .map(|v| parse_level(&v))
                .unwrap_or(Level::INFO),
        };

        Self {
            level,
            use_json: env_flag("BUILDSMITH_LOG_JSON"),
            ..Default::default()
        }
    }
}

/// Parses a log level from a string, defaulting to INFO
///
/// ```
/// use buildsmith::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("Debug"), Level::DEBUG);
/// assert_eq!(parse_level("bogus"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();

    // RUST_LOG, when present, is authoritative
    if env::var("RUST_LOG").is_err() {
        let own = format!("buildsmith={}", level);
        for directive in std::iter::once(own.as_str()).chain(NOISY_DEPENDENCIES.iter().copied()) {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    filter
}

/// Initializes the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_thread_ids(config.include_thread_ids)
            .with_thread_names(config.include_thread_ids);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .init();
        }
    });
}

pub fn init_default() {
    init_logging(LoggingConfig::default());
}

/// Initializes logging from `BUILDSMITH_LOG_LEVEL` and `BUILDSMITH_LOG_JSON`
pub fn init_from_env() {
    init_logging(LoggingConfig::from_cli(None, false, false));
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().to_lowercase().parse::<bool>().ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level(" info "), Level::INFO);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.use_json);
        assert!(config.include_location);
        assert!(config.include_thread_ids);
    }

    #[test]
    #[serial]
    fn test_from_cli_precedence() {
        env::remove_var("BUILDSMITH_LOG_LEVEL");
        assert_eq!(LoggingConfig::from_cli(Some("warn"), true, false).level, Level::WARN);
        assert_eq!(LoggingConfig::from_cli(None, true, false).level, Level::DEBUG);
        assert_eq!(LoggingConfig::from_cli(None, false, true).level, Level::ERROR);
        assert_eq!(LoggingConfig::from_cli(None, false, false).level, Level::INFO);
    }

    #[test]
    #[serial]
    fn test_from_cli_reads_environment() {
        env::set_var("BUILDSMITH_LOG_LEVEL", "trace");
        env::set_var("BUILDSMITH_LOG_JSON", "TRUE");
        let config = LoggingConfig::from_cli(None, false, false);
        env::remove_var("BUILDSMITH_LOG_LEVEL");
        env::remove_var("BUILDSMITH_LOG_JSON");

        assert_eq!(config.level, Level::TRACE);
        assert!(config.use_json);
    }
}
