//! Logging setup
//!
//! The library only emits `tracing` events. Binaries call [`init_logging`]
//! once to install a subscriber, configured from the environment:
//!
//! - `SHADOW_WORKFLOW_LOG` - filter directives (default `shadow_workflow_sdk=info`)
//! - `SHADOW_WORKFLOW_LOG_DIR` - write daily-rotated files there instead of stdout
//! - `SHADOW_WORKFLOW_LOG_FORMAT` - `json` for structured output

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::core::{FrameworkError, FrameworkResult};

const DEFAULT_FILTER: &str = "shadow_workflow_sdk=info";
const LOG_FILE_PREFIX: &str = "shadow-workflow.log";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub filter: String,
    pub log_dir: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            log_dir: None,
            json: false,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            filter: lookup("SHADOW_WORKFLOW_LOG")
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(defaults.filter),
            log_dir: lookup("SHADOW_WORKFLOW_LOG_DIR")
                .filter(|d| !d.is_empty())
                .map(PathBuf::from),
            json: lookup("SHADOW_WORKFLOW_LOG_FORMAT")
                .map_or(false, |f| f.eq_ignore_ascii_case("json")),
        }
    }
}

/// Install the global subscriber
///
/// Returns the writer guard when logging to files; keep it alive for as
/// long as logs should be flushed.
pub fn init_logging(config: &LoggingConfig) -> FrameworkResult<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| FrameworkError::InvalidConfig(format!("log filter: {}", e)))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let (result, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = builder.with_writer(writer).with_ansi(false);
            let result = if config.json {
                builder.json().try_init()
            } else {
                builder.try_init()
            };
            (result, Some(guard))
        }
        None if config.json => (builder.json().try_init(), None),
        None => (builder.try_init(), None),
    };

    result.map_err(|e| FrameworkError::other(format!("failed to install logger: {}", e)))?;
    tracing::debug!(filter = %config.filter, json = config.json, "Logging initialized");
    Ok(guard)
}
