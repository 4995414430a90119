use pool_stats_api::{logging::init_logging, PoolStatsApi};

use crate::args::process_cli_args;

mod args;

/// Entrypoint for the stats API binary.
///
/// Loads the configuration from TOML and runs the server defined in
/// `pool_stats_api::PoolStatsApi` until Ctrl+C. Errors during startup
/// are logged.
#[tokio::main]
async fn main() {
    let config = process_cli_args().unwrap_or_else(|e| {
        eprintln!("Stats API config error: {e}");
        std::process::exit(1);
    });

    init_logging(config.log_dir());

    if let Err(e) = PoolStatsApi::new(config).start().await {
        tracing::error!("Stats API error'ed out: {e}");
    };
}
