//! Subscriber setup: console plus the persistent detection log, text or JSON lines.

use crate::config::LogConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the detector process
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install the global subscriber. Level from RUST_LOG or `config.level`.
    /// Keep the returned guard alive; dropping it flushes the file writer.
    pub fn init(config: &LogConfig, log_file: &Path) -> std::io::Result<WorkerGuard> {
        let dir = log_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let file_name = log_file.file_name().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name")
        })?;

        let appender = tracing_appender::rolling::never(dir, file_name);
        let (file_writer, guard) = tracing_appender::non_blocking(appender);

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
        let json = config.json;

        tracing_subscriber::registry()
            .with(filter)
            .with(json.then(|| {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(file_writer.clone())
            }))
            .with((!json).then(|| {
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(file_writer)
            }))
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
            .init();

        Ok(guard)
    }
}
