//! Laporan (report) endpoints.
//!
//! Every report has a JSON route and an `/export` route returning the same
//! rows as an `.xlsx` download. Period reports take `?dari=&sampai=`
//! (`YYYY-MM-DD`, default: first of this month to today); stock, piutang and
//! hutang are snapshots of the current state.

use axum::extract::State;
use axum::response::Response;
use chrono::NaiveDate;
use niaga_core::report::Periode;
use niaga_core::{Pengeluaran, StatusBayar};
use niaga_db::repository::laporan::{
    HutangRow, LaporanLabaRugi, PembelianRow, PenjualanPerBarang, PenjualanRow, PiutangRow,
    StokRow,
};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::export::{xlsx_response, Cell, Column, Report};
use crate::response::{ApiQuery, ApiResponse};
use crate::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct PeriodeQuery {
    #[serde(default)]
    pub dari: Option<NaiveDate>,
    #[serde(default)]
    pub sampai: Option<NaiveDate>,
}

fn periode(state: &SharedState, query: &PeriodeQuery) -> ApiResult<Periode> {
    Ok(Periode::resolve(query.dari, query.sampai, state.today())?)
}

fn status_label(status: StatusBayar) -> &'static str {
    match status {
        StatusBayar::Lunas => "Lunas",
        StatusBayar::BelumLunas => "Belum lunas",
    }
}

fn title(report: &str, store: &str) -> String {
    format!("LAPORAN {} - {}", report, store)
}

// =============================================================================
// Penjualan
// =============================================================================

pub async fn penjualan(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<ApiResponse<Vec<PenjualanRow>>> {
    let periode = periode(&state, &query)?;
    Ok(ApiResponse::ok(state.db.laporan().penjualan(&periode).await?))
}

pub async fn penjualan_export(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<Response> {
    let periode = periode(&state, &query)?;
    let rows = state.db.laporan().penjualan(&periode).await?;
    let report = penjualan_report(&rows, &periode, &state.config.store_name);
    xlsx_response(&report, periode.dari, periode.sampai)
}

pub fn penjualan_report(rows: &[PenjualanRow], periode: &Periode, store: &str) -> Report {
    let mut report = Report::new(
        "penjualan",
        title("PENJUALAN", store),
        format!("Periode: {}", periode),
        vec![
            Column::new("Nomor", 20.0),
            Column::new("Tanggal", 12.0),
            Column::new("Customer", 22.0),
            Column::new("Sales", 18.0),
            Column::summed("Subtotal", 15.0),
            Column::summed("Diskon", 12.0),
            Column::summed("Total", 15.0),
            Column::summed("Modal", 15.0),
            Column::summed("Laba", 14.0),
            Column::summed("Dibayar", 15.0),
            Column::summed("Sisa", 14.0),
            Column::new("Status", 12.0),
        ],
    );
    for r in rows {
        report.push(vec![
            Cell::text(&r.nomor),
            Cell::Date(r.tanggal),
            Cell::text(r.customer.as_deref().unwrap_or("Umum")),
            Cell::opt_text(r.sales.as_deref()),
            Cell::Money(r.subtotal),
            Cell::Money(r.diskon),
            Cell::Money(r.total),
            Cell::Money(r.total_modal),
            Cell::Money(r.laba),
            Cell::Money(r.dibayar),
            Cell::Money(r.sisa),
            Cell::text(status_label(r.status_bayar)),
        ]);
    }
    report
}

pub async fn penjualan_per_barang(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<ApiResponse<Vec<PenjualanPerBarang>>> {
    let periode = periode(&state, &query)?;
    Ok(ApiResponse::ok(
        state.db.laporan().penjualan_per_barang(&periode).await?,
    ))
}

pub async fn penjualan_per_barang_export(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<Response> {
    let periode = periode(&state, &query)?;
    let rows = state.db.laporan().penjualan_per_barang(&periode).await?;

    let mut report = Report::new(
        "penjualan-barang",
        title("PENJUALAN PER BARANG", &state.config.store_name),
        format!("Periode: {}", periode),
        vec![
            Column::new("Kode", 12.0),
            Column::new("Nama Barang", 30.0),
            Column::summed("Qty (pcs)", 11.0),
            Column::summed("Omzet", 15.0),
            Column::summed("Modal", 15.0),
            Column::summed("Laba", 14.0),
        ],
    );
    for r in &rows {
        report.push(vec![
            Cell::text(&r.kode),
            Cell::text(&r.nama),
            Cell::Number(r.total_pcs),
            Cell::Money(r.omzet),
            Cell::Money(r.modal),
            Cell::Money(r.laba),
        ]);
    }
    xlsx_response(&report, periode.dari, periode.sampai)
}

// =============================================================================
// Pembelian / Pengeluaran
// =============================================================================

pub async fn pembelian(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<ApiResponse<Vec<PembelianRow>>> {
    let periode = periode(&state, &query)?;
    Ok(ApiResponse::ok(state.db.laporan().pembelian(&periode).await?))
}

pub async fn pembelian_export(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<Response> {
    let periode = periode(&state, &query)?;
    let rows = state.db.laporan().pembelian(&periode).await?;

    let mut report = Report::new(
        "pembelian",
        title("PEMBELIAN", &state.config.store_name),
        format!("Periode: {}", periode),
        vec![
            Column::new("Nomor", 20.0),
            Column::new("Tanggal", 12.0),
            Column::new("Supplier", 24.0),
            Column::new("Faktur", 16.0),
            Column::summed("Total", 15.0),
            Column::summed("Dibayar", 15.0),
            Column::summed("Sisa", 14.0),
            Column::new("Status", 12.0),
        ],
    );
    for r in &rows {
        report.push(vec![
            Cell::text(&r.nomor),
            Cell::Date(r.tanggal),
            Cell::text(&r.supplier),
            Cell::opt_text(r.faktur_supplier.as_deref()),
            Cell::Money(r.total),
            Cell::Money(r.dibayar),
            Cell::Money(r.sisa),
            Cell::text(status_label(r.status_bayar)),
        ]);
    }
    xlsx_response(&report, periode.dari, periode.sampai)
}

pub async fn pengeluaran(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<ApiResponse<Vec<Pengeluaran>>> {
    let periode = periode(&state, &query)?;
    Ok(ApiResponse::ok(state.db.laporan().pengeluaran(&periode).await?))
}

pub async fn pengeluaran_export(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<Response> {
    let periode = periode(&state, &query)?;
    let rows = state.db.laporan().pengeluaran(&periode).await?;

    let mut report = Report::new(
        "pengeluaran",
        title("PENGELUARAN", &state.config.store_name),
        format!("Periode: {}", periode),
        vec![
            Column::new("Tanggal", 12.0),
            Column::new("Kategori", 16.0),
            Column::new("Keterangan", 36.0),
            Column::summed("Jumlah", 15.0),
        ],
    );
    for r in &rows {
        report.push(vec![
            Cell::Date(r.tanggal),
            Cell::text(&r.kategori),
            Cell::text(&r.keterangan),
            Cell::Money(r.jumlah),
        ]);
    }
    xlsx_response(&report, periode.dari, periode.sampai)
}

// =============================================================================
// Laba Rugi
// =============================================================================

pub async fn laba_rugi(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<ApiResponse<LaporanLabaRugi>> {
    let periode = periode(&state, &query)?;
    Ok(ApiResponse::ok(state.db.laporan().laba_rugi(&periode).await?))
}

pub async fn laba_rugi_export(
    State(state): State<SharedState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<PeriodeQuery>,
) -> ApiResult<Response> {
    let periode = periode(&state, &query)?;
    let lr = state.db.laporan().laba_rugi(&periode).await?;
    let report = laba_rugi_report(&lr, &state.config.store_name);
    xlsx_response(&report, periode.dari, periode.sampai)
}

pub fn laba_rugi_report(lr: &LaporanLabaRugi, store: &str) -> Report {
    let r = &lr.ringkasan;
    let mut report = Report::new(
        "laba-rugi",
        title("LABA RUGI", store),
        format!("Periode: {} ({} transaksi)", lr.periode, lr.transaksi),
        vec![Column::new("Keterangan", 32.0), Column::new("Jumlah", 18.0)],
    )
    .without_totals();

    let lines = [
        ("Penjualan bersih", r.penjualan),
        ("Diskon diberikan", r.diskon),
        ("Harga pokok penjualan (HPP)", -r.hpp),
        ("Laba kotor", r.laba_kotor),
        ("Pengeluaran operasional", -r.pengeluaran),
        ("Laba bersih", r.laba_bersih),
    ];
    for (label, amount) in lines {
        report.push(vec![Cell::text(label), Cell::Money(amount)]);
    }
    report.push(vec![
        Cell::text("Margin kotor (%)"),
        Cell::text(format_bps(r.margin_kotor_bps)),
    ]);
    report.push(vec![
        Cell::text("Margin bersih (%)"),
        Cell::text(format_bps(r.margin_bersih_bps)),
    ]);
    report
}

/// `1250` → `12,50`
fn format_bps(bps: i64) -> String {
    let sign = if bps < 0 { "-" } else { "" };
    let abs = bps.abs();
    format!("{}{},{:02}", sign, abs / 100, abs % 100)
}

// =============================================================================
// Snapshots
// =============================================================================

pub async fn stok(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<StokRow>>> {
    Ok(ApiResponse::ok(state.db.laporan().stok().await?))
}

pub async fn stok_export(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<Response> {
    let today = state.today();
    let rows = state.db.laporan().stok().await?;

    let mut report = Report::new(
        "stok",
        title("STOK BARANG", &state.config.store_name),
        format!("Per tanggal: {}", today.format("%d-%m-%Y")),
        vec![
            Column::new("Kode", 12.0),
            Column::new("Nama Barang", 30.0),
            Column::new("Satuan", 10.0),
            Column::new("Isi/Dus", 8.0),
            Column::new("Dus", 8.0),
            Column::new("Pcs", 8.0),
            Column::summed("Stok (pcs)", 11.0),
            Column::new("Harga Beli/Dus", 15.0),
            Column::new("Harga Jual/Dus", 15.0),
            Column::summed("Nilai Stok", 16.0),
        ],
    );
    for r in &rows {
        report.push(vec![
            Cell::text(&r.kode),
            Cell::text(&r.nama),
            Cell::text(&r.satuan),
            Cell::Number(r.isi_per_dus),
            Cell::Number(r.stok_dus),
            Cell::Number(r.stok_pcs),
            Cell::Number(r.stok),
            Cell::Money(r.harga_beli),
            Cell::Money(r.harga_jual),
            Cell::Money(r.nilai_stok),
        ]);
    }
    xlsx_response(&report, today, today)
}

pub async fn piutang(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<PiutangRow>>> {
    Ok(ApiResponse::ok(state.db.laporan().piutang().await?))
}

pub async fn piutang_export(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<Response> {
    let today = state.today();
    let rows = state.db.laporan().piutang().await?;

    let mut report = Report::new(
        "piutang",
        title("PIUTANG CUSTOMER", &state.config.store_name),
        format!("Per tanggal: {}", today.format("%d-%m-%Y")),
        vec![
            Column::new("Kode", 10.0),
            Column::new("Customer", 26.0),
            Column::new("Telepon", 15.0),
            Column::new("Limit", 15.0),
            Column::summed("Piutang", 15.0),
            Column::summed("Nota Terbuka", 12.0),
            Column::new("Nota Tertua", 12.0),
        ],
    );
    for r in &rows {
        report.push(vec![
            Cell::text(&r.kode),
            Cell::text(&r.nama),
            Cell::opt_text(r.telepon.as_deref()),
            Cell::Money(r.limit_piutang),
            Cell::Money(r.piutang),
            Cell::Number(r.nota_terbuka),
            r.nota_tertua.map(Cell::Date).unwrap_or(Cell::Empty),
        ]);
    }
    xlsx_response(&report, today, today)
}

pub async fn hutang(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<Vec<HutangRow>>> {
    Ok(ApiResponse::ok(state.db.laporan().hutang().await?))
}

pub async fn hutang_export(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> ApiResult<Response> {
    let today = state.today();
    let rows = state.db.laporan().hutang().await?;

    let mut report = Report::new(
        "hutang",
        title("HUTANG SUPPLIER", &state.config.store_name),
        format!("Per tanggal: {}", today.format("%d-%m-%Y")),
        vec![
            Column::new("Kode", 10.0),
            Column::new("Supplier", 26.0),
            Column::new("Telepon", 15.0),
            Column::summed("Hutang", 15.0),
            Column::summed("Faktur Terbuka", 13.0),
            Column::new("Faktur Tertua", 12.0),
        ],
    );
    for r in &rows {
        report.push(vec![
            Cell::text(&r.kode),
            Cell::text(&r.nama),
            Cell::opt_text(r.telepon.as_deref()),
            Cell::Money(r.hutang),
            Cell::Number(r.faktur_terbuka),
            r.faktur_tertua.map(Cell::Date).unwrap_or(Cell::Empty),
        ]);
    }
    xlsx_response(&report, today, today)
}
