//! ## Pool Stats API
//!
//! Read-only HTTP API over the statistics files a mining pool engine
//! writes to disk. The pool appends one JSON record per line to
//! `pool/pool.status` and maintains one JSON file per miner under
//! `users/`; this crate serves those bytes over a small fixed route
//! table without parsing them.
//!
//! The crate is split along the request path:
//!
//! - [`config`]: TOML settings for the binary.
//! - [`route`]: the closed route table and address validation.
//! - [`stats`]: file readers that assemble response bodies.
//! - [`http_server`]: the axum server tying routes to readers.
//!
//! [`PoolStatsApi`] wires the pieces together for the binary: it starts
//! a [`StatsApiServer`] from the configuration and serves until Ctrl+C.

pub mod config;
pub mod error;
pub mod http_server;
pub mod logging;
pub mod route;
pub mod stats;

use std::net::{Ipv4Addr, SocketAddr};

use tracing::info;

use crate::{config::StatsApiConfig, error::StatsApiResult};
pub use crate::{http_server::StatsApiServer, stats::StatsReader};

/// The stats API application.
///
/// Owns the configuration and drives one [`StatsApiServer`] from
/// startup to shutdown.
#[derive(Debug, Clone)]
pub struct PoolStatsApi {
    config: StatsApiConfig,
}

impl PoolStatsApi {
    pub fn new(config: StatsApiConfig) -> Self {
        Self { config }
    }

    /// Start the API server and serve until Ctrl+C.
    pub async fn start(&self) -> StatsApiResult<()> {
        let bind_address =
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.config.listen_port()));
        let server = StatsApiServer::new(bind_address, self.config.stats_dir());
        server.start().await?;

        tokio::signal::ctrl_c().await?;
        info!("Ctrl+C received, initiating graceful shutdown...");
        server.stop().await;
        info!("Stats API shutdown complete.");
        Ok(())
    }
}
