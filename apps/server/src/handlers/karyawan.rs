//! Karyawan (employee) endpoints. Every write needs an admin.

use axum::extract::{Path, State};
use niaga_core::Karyawan;
use niaga_db::repository::karyawan::NewKaryawan;
use niaga_db::ListFilter;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::handlers::found;
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::SharedState;

pub async fn list(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<ListFilter>,
) -> ApiResult<ApiResponse<Vec<Karyawan>>> {
    Ok(ApiResponse::ok(state.db.karyawan().list(&filter).await?))
}

pub async fn get(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Karyawan>> {
    let karyawan = found(state.db.karyawan().get_by_id(&id).await?, "Karyawan", &id)?;
    Ok(ApiResponse::ok(karyawan))
}

pub async fn create(
    State(state): State<SharedState>,
    _admin: AdminUser,
    ApiJson(input): ApiJson<NewKaryawan>,
) -> ApiResult<ApiResponse<Karyawan>> {
    Ok(ApiResponse::created(state.db.karyawan().create(&input).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewKaryawan>,
) -> ApiResult<ApiResponse<Karyawan>> {
    Ok(ApiResponse::ok(state.db.karyawan().update(&id, &input).await?))
}

pub async fn deactivate(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.db.karyawan().deactivate(&id).await?;
    Ok(ApiResponse::ok(true))
}
