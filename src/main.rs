mod config;
mod errors;
mod numerai;
mod perf;
mod registry;
mod server;
mod state;

use crate::numerai::client::TournamentClient;
use crate::perf::RoundPerformanceSource;
use crate::registry::RegistryProvider;
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("round_watch starting");

    // Load config
    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    let source: Arc<dyn RoundPerformanceSource> = Arc::new(TournamentClient::new(
        &cfg.api_url,
        Duration::from_secs(cfg.http_timeout_secs),
    ));

    // One cache for the whole process, owned by the shared state
    let app_state = AppState::new(cfg.clone(), source);

    match &app_state.registry {
        RegistryProvider::File(path) => {
            tracing::info!(path = %path.display(), "registry: local models table")
        }
        RegistryProvider::Synthetic(s) => {
            tracing::info!(models = s.count, prefix = %s.prefix, "registry: synthetic")
        }
    }
    tracing::info!(
        api = %cfg.api_url,
        ttl_secs = cfg.cache_ttl_secs,
        policy = ?cfg.fetch_policy,
        benchmarks = cfg.include_benchmarks,
        "performance engine ready"
    );

    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{}", cfg.server_port);
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
