//! Barang (goods) endpoints.

use axum::extract::{Path, State};
use chrono::NaiveDate;
use niaga_core::Barang;
use niaga_db::repository::barang::{BarangUpdate, NewBarang, PenyesuaianStok};
use niaga_db::ListFilter;
use serde::{Deserialize, Serialize};

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiResult;
use crate::handlers::found;
use crate::response::{ApiJson, ApiQuery, ApiResponse};
use crate::SharedState;

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Counted stock in pcs.
    pub stok: i64,
    pub alasan: String,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TerjualQuery {
    /// Defaults to today.
    #[serde(default)]
    pub tanggal: Option<NaiveDate>,
}

/// Pieces sold on one business date against the daily limit.
#[derive(Debug, Serialize)]
pub struct Terjual {
    pub barang_id: String,
    pub tanggal: NaiveDate,
    pub terjual: i64,
    pub limit_harian: i64,
    /// `None` when the barang has no daily limit.
    pub sisa_limit: Option<i64>,
}

pub async fn list(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<ListFilter>,
) -> ApiResult<ApiResponse<Vec<Barang>>> {
    Ok(ApiResponse::ok(state.db.barang().list(&filter).await?))
}

pub async fn get(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Barang>> {
    let barang = found(state.db.barang().get_by_id(&id).await?, "Barang", &id)?;
    Ok(ApiResponse::ok(barang))
}

pub async fn create(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiJson(input): ApiJson<NewBarang>,
) -> ApiResult<ApiResponse<Barang>> {
    Ok(ApiResponse::created(state.db.barang().create(&input).await?))
}

pub async fn update(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BarangUpdate>,
) -> ApiResult<ApiResponse<Barang>> {
    Ok(ApiResponse::ok(state.db.barang().update(&id, &input).await?))
}

pub async fn deactivate(
    State(state): State<SharedState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<bool>> {
    state.db.barang().deactivate(&id).await?;
    Ok(ApiResponse::ok(true))
}

/// `POST /api/barang/{id}/stok` - stock opname.
pub async fn adjust_stock(
    State(state): State<SharedState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StockAdjustment>,
) -> ApiResult<ApiResponse<Barang>> {
    let barang = state
        .db
        .barang()
        .adjust_stock(&id, input.stok, &input.alasan, user.id())
        .await?;
    Ok(ApiResponse::ok(barang))
}

pub async fn adjustments(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<PenyesuaianStok>>> {
    Ok(ApiResponse::ok(state.db.barang().adjustments(&id).await?))
}

pub async fn low_stock(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<LowStockQuery>,
) -> ApiResult<ApiResponse<Vec<Barang>>> {
    let limit = query.limit.unwrap_or(50);
    Ok(ApiResponse::ok(state.db.barang().low_stock(limit).await?))
}

/// `GET /api/barang/{id}/terjual`
pub async fn sold(
    State(state): State<SharedState>,
    _user: AuthUser,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<TerjualQuery>,
) -> ApiResult<ApiResponse<Terjual>> {
    let barang = found(state.db.barang().get_by_id(&id).await?, "Barang", &id)?;
    let tanggal = query.tanggal.unwrap_or_else(|| state.today());
    let terjual = state.db.penjualan().sold_pcs_on(&id, tanggal).await?;

    let sisa_limit =
        (barang.limit_harian > 0).then(|| (barang.limit_harian - terjual).max(0));
    Ok(ApiResponse::ok(Terjual {
        barang_id: barang.id,
        tanggal,
        terjual,
        limit_harian: barang.limit_harian,
        sisa_limit,
    }))
}
