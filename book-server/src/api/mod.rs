//! JSON and AJAX endpoints used by the reader widget.

use axum::Json;
use serde_json::json;

pub mod annotations;

/// GET /health
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
