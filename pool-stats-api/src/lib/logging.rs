//! Logging setup for the stats API.

use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Logs go to stdout, and additionally to a daily-rotated file under
/// `log_dir` when one is configured. `RUST_LOG` overrides the default
/// `info` filter.
pub fn init_logging(log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "stats-api.log");
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(file_layer).init();
        }
        None => registry.init(),
    }
}
