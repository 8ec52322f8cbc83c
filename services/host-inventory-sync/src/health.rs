//! Liveness endpoint for container orchestration

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tracing::info;

pub fn router() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "host-inventory-sync",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Serve [`router`] on all interfaces until the process exits
pub async fn serve(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health endpoint listening on {}", addr);

    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_server;

    #[tokio::test]
    async fn test_health_check() {
        let addr = test_server::spawn(router()).await;

        let body: Value = test_server::http_client()
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "host-inventory-sync");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
