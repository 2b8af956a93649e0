//! Binary entry point: parses [`CseConfig`], wires up a [`core::Core`], and
//! runs the HTTP gateway until SIGINT/SIGTERM, the same shutdown shape as
//! the teacher's webhook server run loop.
mod config;
mod core;

use clap::Parser;
use cse_gateway::GatewayOptions;

use crate::config::CseConfig;
use crate::core::Core;

#[tokio::main]
async fn main() {
    let config = CseConfig::parse();

    if let Err(err) = cse_telemetry::init_tracing(config.log_format, config.log_level.0) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    tracing::info!(cse_csi = %config.cse_csi, cse_ri = %config.cse_ri, "starting CSE core");

    let core = Core::bootstrap(&config).await;
    core.spawn_workers();

    let options = GatewayOptions::builder()
        .bind_address(config.bind_ip, config.bind_port)
        .build();

    tokio::select! {
        result = cse_gateway::serve(core.dispatcher.clone(), options) => {
            if let Err(err) = result {
                tracing::error!(%err, "gateway server exited with an error");
            }
        }
        () = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    core.shutdown();
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let ctrl_c = tokio::signal::ctrl_c();

    tokio::select! {
        _ = ctrl_c => {},
        _ = sigterm.recv() => {},
    }
}
