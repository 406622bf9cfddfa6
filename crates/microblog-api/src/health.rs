use axum::{Json, extract::State};
use microblog_db::records::database_is_ready;
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database_ready: bool,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let ready = match state.run_db(|db| db.with_conn(database_is_ready)).await {
        Ok(ready) => ready,
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            false
        }
    };
    Json(HealthResponse {
        status: if ready { "ok" } else { "degraded" },
        database_ready: ready,
    })
}
