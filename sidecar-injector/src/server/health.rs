use axum::{Router, routing::get};

/// Routes answering liveness and readiness probes.
pub fn router() -> Router {
    Router::new().route("/healthz", get(ok)).route("/readyz", get(ok))
}

async fn ok() -> &'static str { "ok" }
