//! Supplier endpoints.

use axum::extract::{Path, State};
use niaga_core::Supplier;
use niaga_db::repository::supplier::NewSupplier;
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
) -> ApiResult<ApiResponse<Vec<Supplier>>> {
    Ok(ApiResponse::ok(state.db.suppliers().list(&filter).await?))
}

pub async fn get(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Supplier>> {
    let supplier = found(state.db.suppliers().get_by_id(&id).await?, "Supplier", &id)?;
    Ok(ApiResponse::ok(supplier))
}

pub async fn create(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<NewSupplier>,
) -> ApiResult<ApiResponse<Supplier>> {
    Ok(ApiResponse::created(state.db.suppliers().create(&input).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewSupplier>,
) -> ApiResult<ApiResponse<Supplier>> {
    Ok(ApiResponse::ok(state.db.suppliers().update(&id, &input).await?))
}

pub async fn deactivate(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.db.suppliers().deactivate(&id).await?;
    Ok(ApiResponse::ok(true))
}
