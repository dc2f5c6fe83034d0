//! HTTP surface: the work endpoint, metrics exposition, and health.
//!
//! Thin plumbing over [`WorkService`]; the handler owns all semantics.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::WorkRequest;
use crate::service::WorkService;

/// Build the router over a shared service instance.
pub fn router(service: Arc<WorkService>) -> Router {
    Router::new()
        .route("/work", post(work))
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(service)
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(service: Arc<WorkService>, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn work(State(service): State<Arc<WorkService>>, Json(req): Json<WorkRequest>) -> Response {
    match service.handle(&req).await {
        Ok(reply) => Json(reply).into_response(),
        // The sole runtime error path: the injected retryable rejection,
        // rendered as 429 so client-side classifiers retry it.
        Err(Error::Exhausted(msg)) => (StatusCode::TOO_MANY_REQUESTS, msg).into_response(),
        Err(other) => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
    }
}

async fn metrics(State(service): State<Arc<WorkService>>) -> Response {
    match service.render_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn healthz() -> &'static str {
    "SERVING"
}
