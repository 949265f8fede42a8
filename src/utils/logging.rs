use std::{path::PathBuf, sync::LazyLock};

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::{format::FmtSpan, writer::MakeWriterExt};

pub const LOG_PREFIX: &str = "journeytrack";

/// How many daily log files are kept around.
const MAX_LOG_FILES: usize = 5;

/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory receiving daily rotated log files.
    pub directory: PathBuf,
    /// Falls back to `RUST_LOG`, then to `debug`.
    pub level: Option<LevelFilter>,
    /// Mirror logs to stdout. Off by default because the timer screen owns the terminal.
    pub console: bool,
}

pub fn enable_logging(config: LoggingConfig) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(LOG_PREFIX)
        .build(&config.directory)?;

    let console = config.console;
    let stdout = std::io::stdout.with_filter(move |_| console);

    let level = config
        .level
        .map(|v| v.to_string())
        .unwrap_or_else(|| std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".into()));

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "{}={level}",
            env!("CARGO_PKG_NAME").replace("-", "_"),
        )))
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(stdout.and(appender))
        .with_ansi(false)
        .init();
    Ok(())
}

pub static TEST_LOGGING: LazyLock<()> = LazyLock::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .pretty()
        .init()
});
