//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// GET /health — liveness check, always reports ok while the server runs.
pub async fn check() -> Json<Health> {
    Json(Health { status: "ok" })
}
