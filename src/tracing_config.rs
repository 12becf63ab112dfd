use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Directory holding the daily log files
const LOG_DIR: &str = "./logs";
const LOG_FILE: &str = "blogicum.log";

/// Console filter when `RUST_LOG` is not set; sqlx logs every statement at
/// info, which drowns request logs.
const DEFAULT_CONSOLE_FILTER: &str = "info,sqlx=warn";

/// Initialize tracing with file and console logging
///
/// Sets up two separate logging layers:
/// 1. Console (stdout): `RUST_LOG`, or INFO and above
/// 2. File: DEBUG and above, rotated daily under `./logs`
///
/// The returned WorkerGuard flushes the non-blocking file writer when dropped,
/// so main() must hold it for the program's lifetime.
pub fn init_tracing() -> tracing_appender::non_blocking::WorkerGuard {
    // blogicum.log.2025-11-01, blogicum.log.2025-11-02, ...
    let file_appender = rolling::daily(LOG_DIR, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_CONSOLE_FILTER));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(false)
        .with_filter(console_filter);

    // Panics if called twice.
    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Tracing initialized (file=debug)");

    guard
}
