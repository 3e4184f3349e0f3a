//! Logging initialisation via tracing-subscriber.
//!
//! Call [`init`] once at startup, after config and CLI flags are resolved.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Directives appended to every filter so HTTP plumbing stays quiet unless
/// `RUST_LOG` asks for it explicitly.
const QUIET_DEPS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Build the filter for `level`.
///
/// If `prefer_level` is `true` (a `-v` flag was given), `level` wins and
/// `RUST_LOG` is only the fallback when `level` does not parse. Otherwise
/// `RUST_LOG` wins and `level` (from config / env) is the fallback.
pub fn build_filter(level: &str, prefer_level: bool) -> Result<EnvFilter, AppError> {
    let filter = if prefer_level {
        match EnvFilter::try_new(level) {
            Ok(filter) => filter,
            Err(level_err) => EnvFilter::try_from_default_env().map_err(|env_err| {
                AppError::Logger(format!(
                    "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
                ))
            })?,
        }
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{level}': {e}")))?
    };

    QUIET_DEPS.iter().try_fold(filter, |f, d| {
        d.parse()
            .map(|directive| f.add_directive(directive))
            .map_err(|e| AppError::Logger(format!("bad built-in directive '{d}': {e}")))
    })
}

/// Initialise the global tracing subscriber, writing to stderr.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let filter = build_filter(level, prefer_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(())
}

/// Parse a log level string into a [`LevelFilter`], returning an error on
/// unrecognised values. Used to validate the configured level before init.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}
