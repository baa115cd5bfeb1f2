//! Request handlers.

pub mod auth;
pub mod items;
pub mod lists;
pub mod sync;

use axum::Json;
use serde_json::{Value, json};

/// GET /api/v1/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
