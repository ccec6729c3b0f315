mod replay;

use std::path::PathBuf;

use cartogram_runtime::CartogramConfig;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::replay::Fixture;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        tracing::error!("usage: cartogram-replay <fixture.json>");
        return;
    };
    let fixture = match Fixture::load(&path) {
        Ok(fixture) => fixture,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "failed to load fixture");
            return;
        }
    };

    let config = CartogramConfig::from_env();
    tracing::info!(
        iterations = config.relaxation_iterations,
        stretch = config.stretch_durations,
        delay_ms = config.delay_animations.as_millis() as u64,
        "Replaying {}",
        path.display()
    );

    tokio::select! {
        result = replay::run(fixture, config) => match result {
            Ok(summary) => match serde_json::to_string(&summary) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "failed to encode summary"),
            },
            Err(e) => tracing::error!(error = %format!("{e:#}"), "replay failed"),
        },
        () = shutdown_signal() => {
            tracing::info!("Replay interrupted");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
