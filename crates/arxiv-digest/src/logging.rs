//! Logging setup: console output plus daily-rotated log files.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file name prefix; files are named `arxiv-digest.YYYY-MM-DD.log`.
pub const LOG_FILE_PREFIX: &str = "arxiv-digest";

/// Default filter when `RUST_LOG` is unset.
#[must_use]
pub fn default_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("arxiv_digest=debug,info")
    } else {
        EnvFilter::new("arxiv_digest=info,warn")
    }
}

/// Daily-rotating appender that keeps at most `retention_days` files.
pub fn file_appender(dir: &Path, retention_days: usize) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(retention_days.max(1))
        .build(dir)
}

/// Install the global subscriber.
///
/// When `log_dir` is given, a second plain-text layer writes to rotated files
/// under it. The returned guard must stay alive for the process lifetime so
/// buffered lines are flushed.
pub fn init(
    verbose: bool,
    log_dir: Option<(&Path, usize)>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

    let (file_layer, guard) = match log_dir {
        Some((dir, retention_days)) => {
            std::fs::create_dir_all(dir)?;
            let (writer, guard) = tracing_appender::non_blocking(file_appender(dir, retention_days)?);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(filter)
        .try_init()?;

    Ok(guard)
}
