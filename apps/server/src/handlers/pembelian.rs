//! Pembelian (purchasing) endpoints. Reads for any login, writes for admins.

use axum::extract::{Path, State};
use niaga_core::{PembelianDetail, PembelianHeader};
use niaga_db::repository::pembelian::{NewPembayaranPembelian, NewPembelian, PembelianFilter};
use tracing::warn;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::handlers::found;
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::SharedState;

pub async fn list(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<PembelianFilter>,
) -> ApiResult<ApiResponse<Vec<PembelianHeader>>> {
    Ok(ApiResponse::ok(state.db.pembelian().list(&filter).await?))
}

pub async fn create(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    ApiJson(input): ApiJson<NewPembelian>,
) -> ApiResult<ApiResponse<PembelianDetail>> {
    let detail = state
        .db
        .pembelian()
        .create(&input, admin.id(), state.today())
        .await?;
    Ok(ApiResponse::created(detail))
}

pub async fn detail(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PembelianDetail>> {
    let detail = found(state.db.pembelian().get_detail(&id).await?, "Pembelian", &id)?;
    Ok(ApiResponse::ok(detail))
}

/// `DELETE /api/pembelian/{id}` - cancel; fails when the goods were already sold.
pub async fn cancel(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PembelianHeader>> {
    let header = state.db.pembelian().cancel(&id).await?;
    warn!(nomor = %header.nomor, by = %admin.claims.username, "Pembelian cancelled");
    Ok(ApiResponse::ok(header))
}

/// `POST /api/pembelian/{id}/pembayaran` - payable payment.
pub async fn add_payment(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewPembayaranPembelian>,
) -> ApiResult<ApiResponse<PembelianDetail>> {
    let detail = state
        .db
        .pembelian()
        .add_payment(&id, &input, admin.id(), state.today())
        .await?;
    Ok(ApiResponse::created(detail))
}
