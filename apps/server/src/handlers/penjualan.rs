//! Penjualan (sales) endpoints.
//!
//! ## Checkout Flow
//! ```text
//! kasir screen
//!   │  GET  /api/penjualan/checkout?cart={…}   price the cart, write nothing
//!   │  POST /api/penjualan/checkout            one transaction, returns the nota
//!   ▼
//! PenjualanRepository::checkout ──► 201 { success, data: PenjualanDetail }
//!                                └─► 400 { success: false, error: "Stok … tidak cukup" }
//! ```

use axum::extract::{Path, State};
use niaga_core::{PembayaranPenjualan, PenjualanDetail, PenjualanHeader};
use niaga_db::repository::penjualan::{
    CheckoutPreview, CheckoutRequest, EditRequest, NewPembayaran, PenjualanFilter,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::handlers::found;
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// JSON-encoded [`CheckoutRequest`].
    pub cart: String,
}

pub async fn list(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<PenjualanFilter>,
) -> ApiResult<ApiResponse<Vec<PenjualanHeader>>> {
    Ok(ApiResponse::ok(state.db.penjualan().list(&filter).await?))
}

/// `POST /api/penjualan/checkout`
pub async fn checkout(
    State(state): State<SharedState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CheckoutRequest>,
) -> ApiResult<ApiResponse<PenjualanDetail>> {
    let today = state.today();
    let detail = state
        .db
        .penjualan()
        .checkout(&req, user.id(), today)
        .await
        .inspect_err(|e| {
            if e.is_business() {
                info!(user = %user.claims.username, error = %e, "Checkout rejected");
            }
        })?;
    Ok(ApiResponse::created(detail))
}

/// `GET /api/penjualan/checkout?cart=…`
pub async fn preview(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PreviewQuery>,
) -> ApiResult<ApiResponse<CheckoutPreview>> {
    let req: CheckoutRequest = serde_json::from_str(&query.cart)
        .map_err(|e| ApiError::BadRequest(format!("cart tidak valid: {}", e)))?;
    let preview = state.db.penjualan().preview(&req, state.today()).await?;
    Ok(ApiResponse::ok(preview))
}

pub async fn detail(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PenjualanDetail>> {
    let detail = found(state.db.penjualan().get_detail(&id).await?, "Penjualan", &id)?;
    Ok(ApiResponse::ok(detail))
}

/// `PUT /api/penjualan/{id}` - replace the cart of a nota.
pub async fn edit(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<EditRequest>,
) -> ApiResult<ApiResponse<PenjualanDetail>> {
    let detail = state
        .db
        .penjualan()
        .edit(&id, &req, admin.id(), state.today())
        .await?;
    info!(nomor = %detail.header.nomor, by = %admin.claims.username, "Nota edited");
    Ok(ApiResponse::ok(detail))
}

/// `DELETE /api/penjualan/{id}` - cancel (batal), never a hard delete.
pub async fn cancel(
    State(state): State<SharedState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PenjualanHeader>> {
    let header = state.db.penjualan().cancel(&id).await?;
    warn!(nomor = %header.nomor, by = %admin.claims.username, "Nota cancelled");
    Ok(ApiResponse::ok(header))
}

/// `GET /api/penjualan/{id}/pembayaran` - payment history, 404 for an unknown nota.
pub async fn payments(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<PembayaranPenjualan>>> {
    Ok(ApiResponse::ok(state.db.penjualan().payments(&id).await?))
}

/// `POST /api/penjualan/{id}/pembayaran` - receivable payment.
pub async fn add_payment(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<NewPembayaran>,
) -> ApiResult<ApiResponse<PenjualanDetail>> {
    let detail = state
        .db
        .penjualan()
        .add_payment(&id, &input, user.id(), state.today())
        .await?;
    Ok(ApiResponse::created(detail))
}
