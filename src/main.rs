use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bsm_relay::config::Config;
use bsm_relay::server::connection_session::SessionSettings;
use bsm_relay::server::network;
use bsm_relay::RelayEngine;

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let engine = RelayEngine::new(&config);
    let addr = config.server.addr();

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "BSM relay listening on {} (object lifetime {}s, idle timeout {}s)",
        addr, config.store.object_lifetime_secs, config.server.idle_timeout_secs
    );

    network::serve(
        listener,
        engine,
        SessionSettings::from(&config.server),
        config.server.max_connections,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        },
    )
    .await;

    info!("BSM relay stopped");
    ExitCode::SUCCESS
}
