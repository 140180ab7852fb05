use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

static INIT: Once = Once::new();

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level
    pub level: Level,
    /// Whether to include source code locations
    pub source_location: bool,
    /// Whether to log spans
    pub log_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            source_location: true,
            log_spans: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// `RUST_LOG` directives override the configured level.
pub fn setup_logging(config: LogConfig) -> Result<(), String> {
    let mut result = Ok(());

    INIT.call_once(|| {
        result = setup_logging_internal(config);
    });

    result
}

fn setup_logging_internal(config: LogConfig) -> Result<(), String> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_ids(true)
        .with_target(true)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(if config.log_spans {
            FmtSpan::FULL
        } else {
            FmtSpan::NONE
        })
        .try_init()
        .map_err(|e| format!("Failed to set global subscriber: {}", e))
}
