use std::env;
use std::path::Path;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Console and file logging with independent levels.
///
/// `TRACING_LEVEL` (default `info`) filters the console, `FILE_TRACING_LEVEL`
/// (default `debug`) filters `LOG_FILE_PATH` (default `./logs/fs-image.log`),
/// which gets the per-file checksum lines. The returned guard flushes the file
/// writer on drop.
pub fn init_logger() -> impl Drop {
    let console_filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let file_filter = env::var("FILE_TRACING_LEVEL").unwrap_or_else(|_| "debug".to_string());

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/fs-image.log".to_string());
    let log_file_path = Path::new(&log_file_path);
    let log_dir = log_file_path.parent().unwrap_or_else(|| Path::new("."));
    let log_name = log_file_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "fs-image.log".into());

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_target(false)
                .without_time()
                .with_ansi(true)
                .with_filter(EnvFilter::new(console_filter)),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(false)
                .with_ansi(false)
                .with_filter(EnvFilter::new(file_filter)),
        )
        .init();

    info!("Logging to console and {}", log_file_path.display());

    guard
}
