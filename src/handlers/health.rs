use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET /health - Liveness probe; does not contact the downstream service
pub async fn get(State(state): State<AppState>) -> Json<Value> {
    let now = chrono::Utc::now();

    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": now,
            "downstream": state.client.base_url(),
        }
    }))
}
