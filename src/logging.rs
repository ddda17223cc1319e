//! Log setup. The terminal belongs to the UI, so everything goes to a daily file.

use crate::config::LogConfig;
use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const MAX_LOG_FILES: usize = 7;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
///
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let dir = config.directory();
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = RollingFileAppender::builder()
    .rotation(Rotation::DAILY)
    .filename_prefix("famlist")
    .filename_suffix("log")
    .max_log_files(MAX_LOG_FILES)
    .build(&dir)
    .map_err(|e| eyre!("Failed to create log file in {}: {}", dir.display(), e))?;
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  tracing::info!(log_dir = %dir.display(), "logging initialized");
  Ok(guard)
}
