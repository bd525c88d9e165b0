use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initializes the logging system with both console and file output.
pub fn init_logging(config: &LoggingConfig) {
    let _ = fs::create_dir_all(&config.dir);

    // Daily rotated JSON log next to the human readable console output
    let file_appender = tracing_appender::rolling::daily(&config.dir, &config.file_prefix);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    // stderr keeps stdout free for `export` output
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("btc_dashboard=info,tower_http=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    // Keep the writer alive for the whole process so logs are flushed on exit
    std::mem::forget(guard);
}
