use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthData {
    /// `ok` when every dependency answered, otherwise `degraded`.
    pub status: String,
    pub database: bool,
    pub storage: bool,
}

impl HealthData {
    pub fn from_checks(database: bool, storage: bool) -> Self {
        let status = if database && storage { "ok" } else { "degraded" };
        Self {
            status: status.to_string(),
            database,
            storage,
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database and object store reachability", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(error = %err, "health: database unreachable");
            false
        }
    };
    let storage = tokio::fs::metadata(state.storage.root())
        .await
        .is_ok_and(|meta| meta.is_dir());
    if !storage {
        tracing::warn!(root = %state.storage.root().display(), "health: storage dir missing");
    }

    Json(ApiResponse::success(
        "Health check",
        HealthData::from_checks(database, storage),
        Some(Meta::empty()),
    ))
}
