use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{database, AppState};

pub struct HealthController;

impl HealthController {
    pub async fn root() -> Json<Value> {
        Json(json!({ "message": "Welcome to Playlist API with SurrealDB" }))
    }

    pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
        if database::ping(&state.db).await {
            (
                StatusCode::OK,
                Json(json!({ "status": "healthy", "database": "surrealdb" })),
            )
        } else {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "surrealdb" })),
            )
        }
    }
}
