//! Pengeluaran (expense) endpoints.

use axum::extract::{Path, State};
use niaga_core::Pengeluaran;
use niaga_db::repository::pengeluaran::{NewPengeluaran, PengeluaranFilter};

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::handlers::found;
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::SharedState;

pub async fn list(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<PengeluaranFilter>,
) -> ApiResult<ApiResponse<Vec<Pengeluaran>>> {
    Ok(ApiResponse::ok(state.db.pengeluaran().list(&filter).await?))
}

pub async fn get(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Pengeluaran>> {
    let row = found(state.db.pengeluaran().get_by_id(&id).await?, "Pengeluaran", &id)?;
    Ok(ApiResponse::ok(row))
}

pub async fn create(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(input): ApiJson<NewPengeluaran>,
) -> ApiResult<ApiResponse<Pengeluaran>> {
    let row = state
        .db
        .pengeluaran()
        .create(&input, user.id(), state.today())
        .await?;
    Ok(ApiResponse::created(row))
}

pub async fn update(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewPengeluaran>,
) -> ApiResult<ApiResponse<Pengeluaran>> {
    let row = state
        .db
        .pengeluaran()
        .update(&id, &input, state.today())
        .await?;
    Ok(ApiResponse::ok(row))
}

pub async fn delete(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.db.pengeluaran().delete(&id).await?;
    Ok(ApiResponse::ok(true))
}
