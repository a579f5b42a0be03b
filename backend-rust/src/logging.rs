//! Structured logging: human-readable to stdout, JSON lines to a daily
//! rolling file under `logging.directory` (C8).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber. The returned `WorkerGuard`
/// must be held for the lifetime of the process — dropping it stops the
/// non-blocking file writer from flushing.
pub fn init(level: &str, directory: &str) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("avl_server={level}")));

    let file_appender = rolling::daily(directory, "log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stdout_layer = fmt::layer().with_target(false);
    let file_layer = fmt::layer().json().with_writer(file_writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
