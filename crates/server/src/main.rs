//! Demo server for `raw-http`.
//!
//! ```text
//! raw-http-server --port 42069 --video assets/vim.mp4 --upstream https://httpbin.org
//! ```

mod app;
mod config;

use clap::Parser;
use raw_http::server::Server;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::App;
use crate::config::Config;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return;
    }

    let config = Config::parse();

    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!(cause = %e, "can't create upstream client");
            return;
        }
    };

    let server = match Server::builder().port(config.port).initial_buffer_size(config.buffer_size).build() {
        Ok(server) => server,
        Err(e) => {
            error!(cause = %e, "invalid server configuration");
            return;
        }
    };

    let handle = match server.serve(app).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(cause = %e, port = config.port, "error starting server");
            return;
        }
    };
    info!(port = config.port, "server started");

    shutdown_signal().await;

    match handle.close().await {
        Ok(()) => info!("server gracefully stopped"),
        Err(e) => error!(cause = %e, "server stopped with error"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(cause = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!(cause = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
