use crate::Result;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use prometheus::{Registry, TextEncoder};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Serves the registered collectors in the text exposition format
pub struct PrometheusExporter {
    registry: Registry,
    addr: SocketAddr,
}

impl PrometheusExporter {
    pub fn new(registry: Registry, addr: SocketAddr) -> Self {
        Self { registry, addr }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/healthz", get(|| async { "ok" }))
            .with_state(self.registry.clone())
    }

    /// Serve until `shutdown` is cancelled
    pub async fn serve(&self, shutdown: CancellationToken) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("Serving metrics on http://{}/metrics", self.addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Metrics server stopped");
        Ok(())
    }

    pub fn format_current_metrics(&self) -> Result<String> {
        format_metrics(&self.registry)
    }
}

fn format_metrics(registry: &Registry) -> Result<String> {
    let text = TextEncoder::new().encode_to_string(&registry.gather())?;
    Ok(text)
}

async fn metrics_handler(State(registry): State<Registry>) -> impl IntoResponse {
    match format_metrics(&registry) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}
