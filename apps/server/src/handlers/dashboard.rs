//! Dashboard summary and the liveness probe.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use niaga_db::repository::laporan::DashboardSummary;
use niaga_db::SchemaStatus;
use serde::Serialize;
use tracing::error;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    /// `None` when the database could not be reached.
    pub schema: Option<SchemaStatus>,
    pub version: &'static str,
}

/// `GET /api/dashboard`
pub async fn summary(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<DashboardSummary>> {
    let summary = state.db.laporan().dashboard(state.today()).await?;
    Ok(ApiResponse::ok(summary))
}

/// `GET /health` - unauthenticated.
pub async fn health(State(state): State<SharedState>) -> Response {
    let database = state.db.health_check().await;
    let schema = if database {
        state.db.schema_status().await.ok()
    } else {
        None
    };
    let body = HealthStatus {
        status: if database { "ok" } else { "degraded" },
        database,
        schema,
        version: env!("CARGO_PKG_VERSION"),
    };

    if database {
        ApiResponse::ok(body).into_response()
    } else {
        error!("Health check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "success": false, "error": "database unreachable", "data": body })),
        )
            .into_response()
    }
}
