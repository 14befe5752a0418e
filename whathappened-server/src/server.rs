use crate::api::{create_router, AppState};
use std::net::SocketAddr;
use tracing::info;
use whathappened_core::{Config, HttpSource, WatchEvaluator};

pub struct WhathappenedServer {
    config: Config,
    state: AppState<HttpSource>,
}

impl WhathappenedServer {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let source = HttpSource::new(&config.api)?;
        let evaluator = WatchEvaluator::new(source)
            .with_max_concurrent_fetches(config.evaluation.max_concurrent_fetches);
        let state = AppState::new(evaluator, config.evaluation.default_osmtypes.clone());

        Ok(Self { config, state })
    }

    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let app = create_router(self.state);

        info!("Server listening on {}", addr);
        info!("OSM API: {}", self.config.api.base_url);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }

    pub fn api_url(&self) -> &str {
        &self.config.api.base_url
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
