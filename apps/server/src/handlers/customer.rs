//! Customer endpoints.

use axum::extract::{Path, State};
use niaga_core::Customer;
use niaga_db::repository::customer::NewCustomer;
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
) -> ApiResult<ApiResponse<Vec<Customer>>> {
    Ok(ApiResponse::ok(state.db.customers().list(&filter).await?))
}

pub async fn get(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Customer>> {
    let customer = found(state.db.customers().get_by_id(&id).await?, "Customer", &id)?;
    Ok(ApiResponse::ok(customer))
}

pub async fn create(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<NewCustomer>,
) -> ApiResult<ApiResponse<Customer>> {
    Ok(ApiResponse::created(state.db.customers().create(&input).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewCustomer>,
) -> ApiResult<ApiResponse<Customer>> {
    Ok(ApiResponse::ok(state.db.customers().update(&id, &input).await?))
}

pub async fn deactivate(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.db.customers().deactivate(&id).await?;
    Ok(ApiResponse::ok(true))
}
