//! Liveness probe for hosting platforms.
//!
//! `GET /` answers 200 so an external monitor considers the process alive.
//! It carries no application state.

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{config::Config, sources::YtDlpResolver};

const ALIVE: &str = "🎵 Open Jukebox está en línea";

pub fn router() -> Router {
    Router::new().route("/", get(|| async { ALIVE }))
}

/// Sirve el endpoint de liveness hasta que se cancele el token
pub async fn serve(addr: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("💓 Liveness escuchando en http://{}", listener.local_addr()?);

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("💓 Liveness detenido");
    Ok(())
}

/// `--health-check`: verifica que el resolver pueda ejecutarse
pub async fn health_check(config: &Config) -> Result<()> {
    let version = YtDlpResolver::new(config).verify().await?;
    info!("✅ yt-dlp versión: {}", version);
    println!("OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root_answers_ok() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, ALIVE.as_bytes());
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let response = router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
