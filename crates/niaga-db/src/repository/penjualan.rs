//! # Penjualan Repository
//!
//! The transactional half of the checkout/edit pipeline. All reads that a
//! business rule depends on (stock, pieces sold today, customer piutang)
//! happen on the transaction's own connection; the pure math lives in
//! `niaga_core::checkout`.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   ├── merge_lines(items)                                                │
//! │   ├── for each barang: fetch row, sold_pcs_on(tanggal)                  │
//! │   │      check_stock / check_daily_limit                               │
//! │   ├── price_cart → summarize                                           │
//! │   ├── fetch customer → settle(total, dibayar, metode, credit)          │
//! │   ├── next_nomor("PJ", tanggal)                                         │
//! │   ├── INSERT penjualan, penjualan_item                                  │
//! │   ├── stok −= pcs                                                       │
//! │   ├── INSERT pembayaran_penjualan (when dibayar > 0)                    │
//! │   └── customer.piutang += sisa                                          │
//! │  COMMIT            (any `?` above drops the transaction → ROLLBACK)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edit
//! ```text
//!  BEGIN
//!   ├── header must be `selesai`
//!   ├── stok += old pcs, old customer.piutang −= old sisa
//!   ├── same pipeline as checkout, daily limit excluding this nota
//!   ├── resettle(total, header.dibayar)
//!   ├── replace items, stok −= new pcs, new customer.piutang += new sisa
//!   ├── payment rows follow the new customer; kembalian → negative row
//!   └── UPDATE header (nomor and tanggal unchanged)
//!  COMMIT
//! ```

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, Utc};
use niaga_core::checkout::{
    self, check_daily_limit, check_payment, check_stock, merge_lines, price_cart, requested_pcs,
    BarangSnapshot, CartLine, CheckoutSummary, CustomerCredit, PricedLine, Settlement,
};
use niaga_core::validation::validate_optional_text;
use niaga_core::{
    CoreError, Metode, Money, PembayaranPenjualan, PenjualanDetail, PenjualanHeader,
    PenjualanItem, StatusBayar, StatusTransaksi,
};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::barang::{self, apply_stock_delta};
use super::customer::{self, apply_piutang_delta};
use super::{generate_id, next_nomor, DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::{DbError, DbResult};

const HEADER_COLUMNS: &str = "id, nomor, tanggal, customer_id, karyawan_id, user_id, subtotal, \
     diskon_item, diskon_nota, total, total_modal, laba, dibayar, sisa, kembalian, metode, \
     status_bayar, status, catatan, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, penjualan_id, barang_id, kode_barang, nama_barang, isi_per_dus, \
     jumlah_dus, jumlah_pcs, total_pcs, harga_jual, harga_beli, diskon_per_dus, subtotal, diskon, \
     total, modal, laba";

/// Catatan on the negative payment row written when an edit refunds money.
pub const KEMBALIAN_EDIT: &str = "Kembalian perubahan nota";

const PAYMENT_COLUMNS: &str =
    "id, penjualan_id, customer_id, tanggal, jumlah, metode, catatan, user_id, created_at";

// =============================================================================
// Requests
// =============================================================================

/// A checkout as posted by the kasir screen.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Sales employee credited with the nota.
    #[serde(default)]
    pub karyawan_id: Option<String>,
    #[serde(default)]
    pub diskon_nota: Money,
    /// Amount tendered. For cash this may exceed the total.
    #[serde(default)]
    pub dibayar: Money,
    #[serde(default)]
    pub metode: Metode,
    #[serde(default)]
    pub catatan: Option<String>,
}

/// A replacement cart for an existing nota. Payments already recorded are
/// kept; new money comes in through [`PenjualanRepository::add_payment`].
#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub karyawan_id: Option<String>,
    #[serde(default)]
    pub diskon_nota: Money,
    #[serde(default)]
    pub metode: Option<Metode>,
    #[serde(default)]
    pub catatan: Option<String>,
}

/// A receivable payment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPembayaran {
    pub jumlah: Money,
    #[serde(default)]
    pub metode: Metode,
    #[serde(default)]
    pub catatan: Option<String>,
    /// Defaults to the current business date.
    #[serde(default)]
    pub tanggal: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PenjualanFilter {
    #[serde(default)]
    pub dari: Option<NaiveDate>,
    #[serde(default)]
    pub sampai: Option<NaiveDate>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub status_bayar: Option<StatusBayar>,
    #[serde(default)]
    pub status: Option<StatusTransaksi>,
    /// Matches the nota number.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// What a checkout would produce, without writing anything.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPreview {
    pub lines: Vec<PricedLine>,
    pub summary: CheckoutSummary,
    pub settlement: Settlement,
}

// =============================================================================
// Pipeline
// =============================================================================

/// The cart-dependent inputs shared by checkout, edit and preview.
struct Cart<'a> {
    items: &'a [CartLine],
    customer_id: Option<&'a str>,
    diskon_nota: Money,
}

/// The result of running the pure pipeline against rows read in the
/// transaction.
struct Plan {
    lines: Vec<PricedLine>,
    summary: CheckoutSummary,
    credit: Option<CustomerCredit>,
}

/// Reads rows on `conn` and runs merge → check → price → summarize.
///
/// `exclude` leaves a nota's own items out of the pieces sold today.
/// `allow_inactive` lists barang that may be kept on an edited nota even
/// though they have since been deactivated.
async fn plan(
    conn: &mut SqliteConnection,
    cart: &Cart<'_>,
    tanggal: NaiveDate,
    exclude: Option<&str>,
    allow_inactive: &BTreeSet<String>,
) -> DbResult<Plan> {
    let lines = merge_lines(cart.items.to_vec())?;

    let mut snapshots = BTreeMap::new();
    for line in &lines {
        if snapshots.contains_key(&line.barang_id) {
            continue;
        }
        let row = barang::fetch(conn, &line.barang_id)
            .await?
            .filter(|b| b.is_active || allow_inactive.contains(&b.id))
            .ok_or_else(|| CoreError::BarangNotFound(line.barang_id.clone()))?;
        snapshots.insert(row.id.clone(), BarangSnapshot::from(&row));
    }

    let (priced, summary) = price_cart(&lines, &snapshots, cart.diskon_nota)?;

    for (barang_id, pcs) in requested_pcs(&priced) {
        let Some(snapshot) = snapshots.get(&barang_id) else {
            continue;
        };
        check_stock(snapshot, pcs, 0)?;
        let sold = sold_pcs_on(conn, &barang_id, tanggal, exclude).await?;
        check_daily_limit(snapshot, sold, pcs)?;
    }

    let credit = match cart.customer_id {
        Some(id) => {
            let c = customer::fetch(conn, id)
                .await?
                .filter(|c| c.is_active)
                .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;
            Some(CustomerCredit::from(&c))
        }
        None => None,
    };

    Ok(Plan {
        lines: priced,
        summary,
        credit,
    })
}

/// Pieces of a barang sold on a business date across non-cancelled notas.
pub(crate) async fn sold_pcs_on(
    conn: &mut SqliteConnection,
    barang_id: &str,
    tanggal: NaiveDate,
    exclude: Option<&str>,
) -> DbResult<i64> {
    let sold: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(i.total_pcs), 0)
        FROM penjualan_item i
        JOIN penjualan p ON p.id = i.penjualan_id
        WHERE i.barang_id = ?1
          AND p.tanggal = ?2
          AND p.status = 'selesai'
          AND (?3 IS NULL OR p.id <> ?3)
        "#,
    )
    .bind(barang_id)
    .bind(tanggal)
    .bind(exclude)
    .fetch_one(&mut *conn)
    .await?;
    Ok(sold)
}

async fn insert_items(
    conn: &mut SqliteConnection,
    penjualan_id: &str,
    lines: &[PricedLine],
) -> DbResult<()> {
    for line in lines {
        let t = &line.totals;
        sqlx::query(
            r#"
            INSERT INTO penjualan_item (
                id, penjualan_id, barang_id, kode_barang, nama_barang, isi_per_dus,
                jumlah_dus, jumlah_pcs, total_pcs, harga_jual, harga_beli, diskon_per_dus,
                subtotal, diskon, total, modal, laba
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
        )
        .bind(generate_id())
        .bind(penjualan_id)
        .bind(&line.barang.id)
        .bind(&line.barang.kode)
        .bind(&line.barang.nama)
        .bind(line.barang.isi_per_dus)
        .bind(t.kuantitas.dus)
        .bind(t.kuantitas.pcs)
        .bind(t.total_pcs)
        .bind(t.harga_jual)
        .bind(t.harga_beli)
        .bind(t.diskon_per_dus)
        .bind(t.subtotal)
        .bind(t.diskon)
        .bind(t.total)
        .bind(t.modal)
        .bind(t.laba)
        .execute(&mut *conn)
        .await?;
    }

    for (barang_id, pcs) in requested_pcs(lines) {
        apply_stock_delta(conn, &barang_id, -pcs).await?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_payment(
    conn: &mut SqliteConnection,
    penjualan_id: &str,
    customer_id: Option<&str>,
    tanggal: NaiveDate,
    jumlah: Money,
    metode: Metode,
    catatan: Option<&str>,
    user_id: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pembayaran_penjualan (
            id, penjualan_id, customer_id, tanggal, jumlah, metode, catatan, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(generate_id())
    .bind(penjualan_id)
    .bind(customer_id)
    .bind(tanggal)
    .bind(jumlah)
    .bind(metode)
    .bind(catatan)
    .bind(user_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_header(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PenjualanHeader>> {
    let sql = format!("SELECT {HEADER_COLUMNS} FROM penjualan WHERE id = ?1");
    let row = sqlx::query_as::<_, PenjualanHeader>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn fetch_items(conn: &mut SqliteConnection, id: &str) -> DbResult<Vec<PenjualanItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM penjualan_item WHERE penjualan_id = ?1 ORDER BY rowid");
    let rows = sqlx::query_as::<_, PenjualanItem>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn fetch_payments(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Vec<PembayaranPenjualan>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM pembayaran_penjualan WHERE penjualan_id = ?1 ORDER BY created_at, rowid"
    );
    let rows = sqlx::query_as::<_, PembayaranPenjualan>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PenjualanDetail>> {
    let Some(header) = fetch_header(conn, id).await? else {
        return Ok(None);
    };

    let customer_nama = match header.customer_id.as_deref() {
        Some(cid) => customer::fetch(conn, cid).await?.map(|c| c.nama),
        None => None,
    };
    let items = fetch_items(conn, id).await?;
    let pembayaran = fetch_payments(conn, id).await?;

    Ok(Some(PenjualanDetail {
        header,
        customer_nama,
        items,
        pembayaran,
    }))
}

/// Gives a nota's pieces back to stock and removes its sisa from the
/// customer's piutang.
async fn reverse_effects(
    conn: &mut SqliteConnection,
    header: &PenjualanHeader,
    items: &[PenjualanItem],
) -> DbResult<()> {
    let mut returned: BTreeMap<&str, i64> = BTreeMap::new();
    for item in items {
        *returned.entry(item.barang_id.as_str()).or_insert(0) += item.total_pcs;
    }
    for (barang_id, pcs) in returned {
        apply_stock_delta(conn, barang_id, pcs).await?;
    }

    if let Some(cid) = header.customer_id.as_deref() {
        apply_piutang_delta(conn, cid, -header.sisa).await?;
    }
    Ok(())
}

fn ensure_selesai(header: &PenjualanHeader) -> DbResult<()> {
    if header.status == StatusTransaksi::Batal {
        return Err(CoreError::InvalidStatus {
            nomor: header.nomor.clone(),
            status: header.status.as_str().to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sales notas.
#[derive(Debug, Clone)]
pub struct PenjualanRepository {
    pool: SqlitePool,
}

impl PenjualanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PenjualanRepository { pool }
    }

    /// Records a sale. Nothing is written unless every rule passes.
    pub async fn checkout(
        &self,
        req: &CheckoutRequest,
        user_id: &str,
        tanggal: NaiveDate,
    ) -> DbResult<PenjualanDetail> {
        validate_optional_text("catatan", req.catatan.as_deref(), 500)?;

        let mut tx = self.pool.begin().await?;

        let cart = Cart {
            items: &req.items,
            customer_id: req.customer_id.as_deref(),
            diskon_nota: req.diskon_nota,
        };
        let plan = plan(&mut tx, &cart, tanggal, None, &BTreeSet::new()).await?;
        let settlement = checkout::settle(
            plan.summary.total,
            req.dibayar,
            req.metode,
            plan.credit.as_ref(),
        )?;

        let id = generate_id();
        let nomor = next_nomor(&mut tx, "PJ", tanggal).await?;
        let now = Utc::now();
        let s = &plan.summary;

        sqlx::query(
            r#"
            INSERT INTO penjualan (
                id, nomor, tanggal, customer_id, karyawan_id, user_id,
                subtotal, diskon_item, diskon_nota, total, total_modal, laba,
                dibayar, sisa, kembalian, metode, status_bayar, status, catatan,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                      'selesai', ?18, ?19, ?19)
            "#,
        )
        .bind(&id)
        .bind(&nomor)
        .bind(tanggal)
        .bind(&req.customer_id)
        .bind(&req.karyawan_id)
        .bind(user_id)
        .bind(s.subtotal)
        .bind(s.diskon_item)
        .bind(s.diskon_nota)
        .bind(s.total)
        .bind(s.total_modal)
        .bind(s.laba)
        .bind(settlement.dibayar)
        .bind(settlement.sisa)
        .bind(settlement.kembalian)
        .bind(req.metode)
        .bind(settlement.status_bayar)
        .bind(&req.catatan)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        insert_items(&mut tx, &id, &plan.lines).await?;

        if settlement.dibayar.is_positive() {
            insert_payment(
                &mut tx,
                &id,
                req.customer_id.as_deref(),
                tanggal,
                settlement.dibayar,
                req.metode,
                None,
                user_id,
            )
            .await?;
        }

        if let Some(cid) = req.customer_id.as_deref() {
            apply_piutang_delta(&mut tx, cid, settlement.sisa).await?;
        }

        let detail = fetch_detail(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", &id))?;

        tx.commit().await?;

        info!(
            nomor = %nomor,
            total = %s.total,
            laba = %s.laba,
            sisa = %settlement.sisa,
            lines = plan.lines.len(),
            "Checkout completed"
        );
        Ok(detail)
    }

    /// Prices a cart against the current catalogue without writing.
    ///
    /// Runs the same reads as checkout inside a transaction that is rolled
    /// back, so the answer matches what checkout would do right now.
    pub async fn preview(&self, req: &CheckoutRequest, tanggal: NaiveDate) -> DbResult<CheckoutPreview> {
        let mut tx = self.pool.begin().await?;

        let cart = Cart {
            items: &req.items,
            customer_id: req.customer_id.as_deref(),
            diskon_nota: req.diskon_nota,
        };
        let plan = plan(&mut tx, &cart, tanggal, None, &BTreeSet::new()).await?;
        let settlement = checkout::settle(
            plan.summary.total,
            req.dibayar,
            req.metode,
            plan.credit.as_ref(),
        )?;

        tx.rollback().await?;

        Ok(CheckoutPreview {
            lines: plan.lines,
            summary: plan.summary,
            settlement,
        })
    }

    /// Replaces the cart of an existing nota.
    ///
    /// The nota keeps the money it currently holds (`header.dibayar`). When
    /// the new total is lower, the surplus is handed back as kembalian and
    /// recorded as a negative payment row dated `today`, so the payment
    /// history always sums to `dibayar`.
    pub async fn edit(
        &self,
        id: &str,
        req: &EditRequest,
        user_id: &str,
        today: NaiveDate,
    ) -> DbResult<PenjualanDetail> {
        validate_optional_text("catatan", req.catatan.as_deref(), 500)?;

        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;
        ensure_selesai(&header)?;

        let old_items = fetch_items(&mut tx, id).await?;
        reverse_effects(&mut tx, &header, &old_items).await?;

        // Net of earlier refunds, unlike the sum of positive payments.
        let sudah_dibayar = header.dibayar;

        let allow_inactive: BTreeSet<String> =
            old_items.iter().map(|i| i.barang_id.clone()).collect();
        let cart = Cart {
            items: &req.items,
            customer_id: req.customer_id.as_deref(),
            diskon_nota: req.diskon_nota,
        };
        let plan = plan(&mut tx, &cart, header.tanggal, Some(id), &allow_inactive).await?;
        let settlement =
            checkout::resettle(plan.summary.total, sudah_dibayar, plan.credit.as_ref())?;

        sqlx::query("DELETE FROM penjualan_item WHERE penjualan_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, id, &plan.lines).await?;

        if let Some(cid) = req.customer_id.as_deref() {
            apply_piutang_delta(&mut tx, cid, settlement.sisa).await?;
        }

        if header.customer_id != req.customer_id {
            sqlx::query("UPDATE pembayaran_penjualan SET customer_id = ?2 WHERE penjualan_id = ?1")
                .bind(id)
                .bind(&req.customer_id)
                .execute(&mut *tx)
                .await?;
        }

        if settlement.kembalian.is_positive() {
            insert_payment(
                &mut tx,
                id,
                req.customer_id.as_deref(),
                today,
                -settlement.kembalian,
                Metode::Tunai,
                Some(KEMBALIAN_EDIT),
                user_id,
            )
            .await?;
        }

        let s = &plan.summary;
        sqlx::query(
            r#"
            UPDATE penjualan SET
                customer_id = ?2, karyawan_id = ?3,
                subtotal = ?4, diskon_item = ?5, diskon_nota = ?6, total = ?7,
                total_modal = ?8, laba = ?9, dibayar = ?10, sisa = ?11, kembalian = ?12,
                metode = ?13, status_bayar = ?14, catatan = ?15, updated_at = ?16
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&req.customer_id)
        .bind(&req.karyawan_id)
        .bind(s.subtotal)
        .bind(s.diskon_item)
        .bind(s.diskon_nota)
        .bind(s.total)
        .bind(s.total_modal)
        .bind(s.laba)
        .bind(settlement.dibayar)
        .bind(settlement.sisa)
        .bind(settlement.kembalian)
        .bind(req.metode.unwrap_or(header.metode))
        .bind(settlement.status_bayar)
        .bind(req.catatan.as_ref().or(header.catatan.as_ref()))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let detail = fetch_detail(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;

        tx.commit().await?;

        info!(
            nomor = %header.nomor,
            total_lama = %header.total,
            total_baru = %s.total,
            sisa = %settlement.sisa,
            "Penjualan edited"
        );
        Ok(detail)
    }

    /// Cancels a nota: stock and piutang are restored, the nota stays on
    /// record as `batal`.
    pub async fn cancel(&self, id: &str) -> DbResult<PenjualanHeader> {
        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;
        ensure_selesai(&header)?;

        let items = fetch_items(&mut tx, id).await?;
        reverse_effects(&mut tx, &header, &items).await?;

        sqlx::query("UPDATE penjualan SET status = 'batal', updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let cancelled = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;

        tx.commit().await?;

        if header.dibayar.is_positive() {
            warn!(nomor = %header.nomor, dibayar = %header.dibayar, "Cancelled nota had payments");
        }
        info!(nomor = %header.nomor, "Penjualan cancelled");
        Ok(cancelled)
    }

    /// Records a receivable payment against a nota.
    pub async fn add_payment(
        &self,
        id: &str,
        input: &NewPembayaran,
        user_id: &str,
        today: NaiveDate,
    ) -> DbResult<PenjualanDetail> {
        validate_optional_text("catatan", input.catatan.as_deref(), 500)?;

        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;
        ensure_selesai(&header)?;
        check_payment(input.jumlah, header.sisa)?;

        insert_payment(
            &mut tx,
            id,
            header.customer_id.as_deref(),
            input.tanggal.unwrap_or(today),
            input.jumlah,
            input.metode,
            input.catatan.as_deref(),
            user_id,
        )
        .await?;

        let sisa = header.sisa - input.jumlah;
        sqlx::query(
            r#"
            UPDATE penjualan SET dibayar = dibayar + ?2, sisa = ?3, status_bayar = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.jumlah)
        .bind(sisa)
        .bind(StatusBayar::from_sisa(sisa))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if let Some(cid) = header.customer_id.as_deref() {
            apply_piutang_delta(&mut tx, cid, -input.jumlah).await?;
        }

        let detail = fetch_detail(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;

        tx.commit().await?;

        info!(nomor = %header.nomor, jumlah = %input.jumlah, sisa = %sisa, "Piutang payment recorded");
        Ok(detail)
    }

    /// Gets a nota with its lines and payments.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<PenjualanDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    /// Payments recorded against a nota, oldest first.
    ///
    /// Returns `NotFound` for an unknown nota rather than an empty list.
    pub async fn payments(&self, id: &str) -> DbResult<Vec<PembayaranPenjualan>> {
        let mut conn = self.pool.acquire().await?;
        fetch_header(&mut conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Penjualan", id))?;
        fetch_payments(&mut conn, id).await
    }

    /// Lists nota headers, newest first.
    pub async fn list(&self, filter: &PenjualanFilter) -> DbResult<Vec<PenjualanHeader>> {
        debug!(?filter, "Listing penjualan");

        let sql = format!(
            r#"
            SELECT {HEADER_COLUMNS}
            FROM penjualan
            WHERE (?1 IS NULL OR tanggal >= ?1)
              AND (?2 IS NULL OR tanggal <= ?2)
              AND (?3 IS NULL OR customer_id = ?3)
              AND (?4 IS NULL OR status_bayar = ?4)
              AND (?5 IS NULL OR status = ?5)
              AND nomor LIKE ?6 ESCAPE '\'
            ORDER BY tanggal DESC, nomor DESC
            LIMIT ?7 OFFSET ?8
            "#
        );

        let rows = sqlx::query_as::<_, PenjualanHeader>(&sql)
            .bind(filter.dari)
            .bind(filter.sampai)
            .bind(&filter.customer_id)
            .bind(filter.status_bayar)
            .bind(filter.status)
            .bind(super::like_pattern(filter.q.as_deref())?)
            .bind(filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
            .bind(filter.offset.unwrap_or(0).max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Pieces of a barang sold on a business date (non-cancelled notas).
    pub async fn sold_pcs_on(&self, barang_id: &str, tanggal: NaiveDate) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        sold_pcs_on(&mut conn, barang_id, tanggal, None).await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{setup, susu, tanggal, toko};
    use crate::Database;

    fn line(barang_id: &str, dus: i64, pcs: i64) -> CartLine {
        CartLine {
            barang_id: barang_id.to_string(),
            jumlah_dus: dus,
            jumlah_pcs: pcs,
            harga_jual: None,
            diskon_per_dus: Money::zero(),
        }
    }

    fn tunai(items: Vec<CartLine>, dibayar: i64) -> CheckoutRequest {
        CheckoutRequest {
            items,
            customer_id: None,
            karyawan_id: None,
            diskon_nota: Money::zero(),
            dibayar: Money::from_rupiah(dibayar),
            metode: Metode::Tunai,
            catatan: None,
        }
    }

    async fn stok(db: &Database, id: &str) -> i64 {
        db.barang().get_by_id(id).await.unwrap().unwrap().stok
    }

    async fn piutang(db: &Database, id: &str) -> i64 {
        db.customers().get_by_id(id).await.unwrap().unwrap().piutang.rupiah()
    }

    #[tokio::test]
    async fn test_checkout_cash_with_change() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;

        let nota = db
            .penjualan()
            .checkout(&tunai(vec![line(&b.id, 1, 12)], 200_000), &admin.id, tanggal(10))
            .await
            .unwrap();

        let h = &nota.header;
        assert_eq!(h.nomor, "PJ-20240510-0001");
        assert_eq!(h.total.rupiah(), 180_000);
        assert_eq!(h.total_modal.rupiah(), 144_000);
        assert_eq!(h.laba.rupiah(), 36_000);
        assert_eq!(h.kembalian.rupiah(), 20_000);
        assert_eq!(h.dibayar.rupiah(), 180_000);
        assert_eq!(h.status_bayar, StatusBayar::Lunas);
        assert_eq!(nota.items.len(), 1);
        assert_eq!(nota.items[0].total_pcs, 36);
        assert_eq!(nota.pembayaran.len(), 1);
        assert_eq!(stok(&db, &b.id).await, 64);

        let second = db
            .penjualan()
            .checkout(&tunai(vec![line(&b.id, 0, 1)], 5_000), &admin.id, tanggal(10))
            .await
            .unwrap();
        assert_eq!(second.header.nomor, "PJ-20240510-0002");
    }

    #[tokio::test]
    async fn test_insufficient_stock_writes_nothing() {
        let (db, admin) = setup().await;
        let b = susu(&db, 30, 0).await;

        let err = db
            .penjualan()
            .checkout(&tunai(vec![line(&b.id, 2, 0)], 240_000), &admin.id, tanggal(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { tersedia: 30, diminta: 48, .. })
        ));

        assert_eq!(stok(&db, &b.id).await, 30);
        assert!(db.penjualan().list(&PenjualanFilter::default()).await.unwrap().is_empty());

        // The failed attempt did not consume a nota number
        let ok = db
            .penjualan()
            .checkout(&tunai(vec![line(&b.id, 1, 0)], 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();
        assert_eq!(ok.header.nomor, "PJ-20240510-0001");
    }

    #[tokio::test]
    async fn test_credit_sale_requires_customer_and_limit() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let c = toko(&db, 150_000).await;

        let err = db
            .penjualan()
            .checkout(&tunai(vec![line(&b.id, 1, 0)], 50_000), &admin.id, tanggal(10))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CreditNotAllowed { .. })));

        let mut req = tunai(vec![line(&b.id, 1, 0)], 0);
        req.customer_id = Some(c.id.clone());
        req.metode = Metode::Tempo;
        let nota = db.penjualan().checkout(&req, &admin.id, tanggal(10)).await.unwrap();
        assert_eq!(nota.header.sisa.rupiah(), 120_000);
        assert!(nota.pembayaran.is_empty());
        assert_eq!(piutang(&db, &c.id).await, 120_000);

        // 120.000 + 120.000 > 150.000
        let err = db.penjualan().checkout(&req, &admin.id, tanggal(10)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CreditLimitExceeded { .. })));
        assert_eq!(stok(&db, &b.id).await, 76);
    }

    #[tokio::test]
    async fn test_daily_limit_counts_same_day_only() {
        let (db, admin) = setup().await;
        let b = susu(&db, 500, 48).await;
        let repo = db.penjualan();

        repo.checkout(&tunai(vec![line(&b.id, 1, 0)], 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();
        let err = repo
            .checkout(&tunai(vec![line(&b.id, 1, 1)], 200_000), &admin.id, tanggal(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::DailyLimitExceeded { terjual: 24, diminta: 25, .. })
        ));

        // A new business date starts from zero
        repo.checkout(&tunai(vec![line(&b.id, 2, 0)], 240_000), &admin.id, tanggal(11))
            .await
            .unwrap();
        assert_eq!(repo.sold_pcs_on(&b.id, tanggal(10)).await.unwrap(), 24);
        assert_eq!(repo.sold_pcs_on(&b.id, tanggal(11)).await.unwrap(), 48);
    }

    #[tokio::test]
    async fn test_cancelled_sales_free_the_daily_limit() {
        let (db, admin) = setup().await;
        let b = susu(&db, 500, 24).await;
        let repo = db.penjualan();

        let nota = repo
            .checkout(&tunai(vec![line(&b.id, 1, 0)], 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();
        repo.cancel(&nota.header.id).await.unwrap();

        repo.checkout(&tunai(vec![line(&b.id, 1, 0)], 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_edit_excludes_own_items_from_daily_limit() {
        let (db, admin) = setup().await;
        let b = susu(&db, 500, 48).await;
        let repo = db.penjualan();

        let nota = repo
            .checkout(&tunai(vec![line(&b.id, 2, 0)], 240_000), &admin.id, tanggal(10))
            .await
            .unwrap();

        // Re-saving the same 48 pcs must not count the nota's own 48 pcs
        let edited = repo
            .edit(
                &nota.header.id,
                &EditRequest {
                    items: vec![line(&b.id, 1, 12)],
                    customer_id: None,
                    karyawan_id: None,
                    diskon_nota: Money::zero(),
                    metode: None,
                    catatan: Some("koreksi".to_string()),
                },
                &admin.id,
                tanggal(11),
            )
            .await
            .unwrap();

        assert_eq!(edited.header.nomor, nota.header.nomor);
        assert_eq!(edited.header.total.rupiah(), 180_000);
        // Paid 240.000, now owes 180.000: 60.000 due back
        assert_eq!(edited.header.dibayar.rupiah(), 180_000);
        assert_eq!(edited.header.kembalian.rupiah(), 60_000);
        assert_eq!(edited.pembayaran.len(), 2);
        assert_eq!(edited.pembayaran[1].jumlah.rupiah(), -60_000);
        assert_eq!(edited.pembayaran[1].catatan.as_deref(), Some(KEMBALIAN_EDIT));
        assert_eq!(stok(&db, &b.id).await, 464);
        assert_eq!(repo.sold_pcs_on(&b.id, tanggal(10)).await.unwrap(), 36);
    }

    #[tokio::test]
    async fn test_edit_restores_stock_and_piutang_before_reapplying() {
        let (db, admin) = setup().await;
        let b = susu(&db, 48, 0).await;
        let c = toko(&db, 0).await;
        let repo = db.penjualan();

        let mut req = tunai(vec![line(&b.id, 2, 0)], 40_000);
        req.customer_id = Some(c.id.clone());
        let nota = repo.checkout(&req, &admin.id, tanggal(10)).await.unwrap();
        assert_eq!(stok(&db, &b.id).await, 0);
        assert_eq!(piutang(&db, &c.id).await, 200_000);

        // Would fail without giving the 48 pcs back first
        let edited = repo
            .edit(
                &nota.header.id,
                &EditRequest {
                    items: vec![line(&b.id, 1, 0)],
                    customer_id: Some(c.id.clone()),
                    karyawan_id: None,
                    diskon_nota: Money::zero(),
                    metode: None,
                    catatan: None,
                },
                &admin.id,
                tanggal(11),
            )
            .await
            .unwrap();

        assert_eq!(stok(&db, &b.id).await, 24);
        assert_eq!(edited.header.dibayar.rupiah(), 40_000);
        assert_eq!(edited.header.sisa.rupiah(), 80_000);
        assert_eq!(piutang(&db, &c.id).await, 80_000);
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_nota_untouched() {
        let (db, admin) = setup().await;
        let b = susu(&db, 30, 0).await;
        let repo = db.penjualan();

        let nota = repo
            .checkout(&tunai(vec![line(&b.id, 1, 0)], 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();

        let err = repo
            .edit(
                &nota.header.id,
                &EditRequest {
                    items: vec![line(&b.id, 2, 0)],
                    customer_id: None,
                    karyawan_id: None,
                    diskon_nota: Money::zero(),
                    metode: None,
                    catatan: None,
                },
                &admin.id,
                tanggal(11),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InsufficientStock { .. })));

        assert_eq!(stok(&db, &b.id).await, 6);
        let detail = repo.get_detail(&nota.header.id).await.unwrap().unwrap();
        assert_eq!(detail.items[0].total_pcs, 24);
    }

    fn ubah(items: Vec<CartLine>, customer_id: Option<&str>) -> EditRequest {
        EditRequest {
            items,
            customer_id: customer_id.map(str::to_string),
            karyawan_id: None,
            diskon_nota: Money::zero(),
            metode: None,
            catatan: None,
        }
    }

    #[tokio::test]
    async fn test_edit_back_up_after_refund_leaves_balance_owing() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let c = toko(&db, 0).await;
        let repo = db.penjualan();

        let mut req = tunai(vec![line(&b.id, 2, 0)], 240_000);
        req.customer_id = Some(c.id.clone());
        let nota = repo.checkout(&req, &admin.id, tanggal(10)).await.unwrap();
        let id = nota.header.id.clone();

        let turun = repo
            .edit(&id, &ubah(vec![line(&b.id, 1, 0)], Some(&c.id)), &admin.id, tanggal(11))
            .await
            .unwrap();
        assert_eq!(turun.header.dibayar.rupiah(), 120_000);
        assert_eq!(turun.header.kembalian.rupiah(), 120_000);
        assert_eq!(turun.header.status_bayar, StatusBayar::Lunas);

        // The 120.000 handed back is no longer held by the nota
        let naik = repo
            .edit(&id, &ubah(vec![line(&b.id, 2, 0)], Some(&c.id)), &admin.id, tanggal(12))
            .await
            .unwrap();
        assert_eq!(naik.header.total.rupiah(), 240_000);
        assert_eq!(naik.header.dibayar.rupiah(), 120_000);
        assert_eq!(naik.header.sisa.rupiah(), 120_000);
        assert_eq!(naik.header.kembalian.rupiah(), 0);
        assert_eq!(naik.header.status_bayar, StatusBayar::BelumLunas);
        assert_eq!(piutang(&db, &c.id).await, 120_000);

        let paid: Money = repo.payments(&id).await.unwrap().iter().map(|p| p.jumlah).sum();
        assert_eq!(paid, naik.header.dibayar);
        assert_eq!(stok(&db, &b.id).await, 52);
    }

    #[tokio::test]
    async fn test_edit_moves_nota_to_another_customer() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let lama = toko(&db, 0).await;
        let baru = db
            .customers()
            .create(&customer::NewCustomer {
                kode: "C-002".to_string(),
                nama: "Toko Baru".to_string(),
                alamat: None,
                telepon: None,
                limit_piutang: Money::from_rupiah(100_000),
            })
            .await
            .unwrap();
        let repo = db.penjualan();

        let mut req = tunai(vec![line(&b.id, 2, 0)], 40_000);
        req.customer_id = Some(lama.id.clone());
        let nota = repo.checkout(&req, &admin.id, tanggal(10)).await.unwrap();
        let id = nota.header.id.clone();
        assert_eq!(piutang(&db, &lama.id).await, 200_000);

        // 200.000 owing is over the new customer's 100.000 limit
        let err = repo
            .edit(&id, &ubah(vec![line(&b.id, 2, 0)], Some(&baru.id)), &admin.id, tanggal(11))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CreditLimitExceeded { .. })));
        assert_eq!(piutang(&db, &lama.id).await, 200_000);
        assert_eq!(piutang(&db, &baru.id).await, 0);
        assert_eq!(stok(&db, &b.id).await, 52);

        let moved = repo
            .edit(&id, &ubah(vec![line(&b.id, 1, 0)], Some(&baru.id)), &admin.id, tanggal(11))
            .await
            .unwrap();
        assert_eq!(moved.header.customer_id.as_deref(), Some(baru.id.as_str()));
        assert_eq!(moved.header.sisa.rupiah(), 80_000);
        assert_eq!(piutang(&db, &lama.id).await, 0);
        assert_eq!(piutang(&db, &baru.id).await, 80_000);

        let payments = repo.payments(&id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert!(payments.iter().all(|p| p.customer_id.as_deref() == Some(baru.id.as_str())));
    }

    #[tokio::test]
    async fn test_edit_rejects_overflowing_quantity() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let repo = db.penjualan();

        let nota = repo
            .checkout(&tunai(vec![line(&b.id, 1, 0)], 120_000), &admin.id, tanggal(10))
            .await
            .unwrap();

        let err = repo
            .edit(
                &nota.header.id,
                &ubah(vec![line(&b.id, 768_614_336_404_564_651, 0)], None),
                &admin.id,
                tanggal(11),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(stok(&db, &b.id).await, 76);
    }

    #[tokio::test]
    async fn test_payments_of_unknown_nota_is_not_found() {
        let (db, _) = setup().await;
        let err = db.penjualan().payments("tidak-ada").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_and_piutang() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let c = toko(&db, 0).await;
        let repo = db.penjualan();

        let mut req = tunai(vec![line(&b.id, 1, 0)], 0);
        req.customer_id = Some(c.id.clone());
        req.metode = Metode::Tempo;
        let nota = repo.checkout(&req, &admin.id, tanggal(10)).await.unwrap();

        let cancelled = repo.cancel(&nota.header.id).await.unwrap();
        assert_eq!(cancelled.status, StatusTransaksi::Batal);
        assert_eq!(stok(&db, &b.id).await, 100);
        assert_eq!(piutang(&db, &c.id).await, 0);

        let err = repo.cancel(&nota.header.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_payment_cannot_exceed_sisa() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let c = toko(&db, 0).await;
        let repo = db.penjualan();

        let mut req = tunai(vec![line(&b.id, 1, 0)], 20_000);
        req.customer_id = Some(c.id.clone());
        let nota = repo.checkout(&req, &admin.id, tanggal(10)).await.unwrap();
        let id = nota.header.id.clone();

        let bayar = |jumlah| NewPembayaran {
            jumlah: Money::from_rupiah(jumlah),
            metode: Metode::Transfer,
            catatan: None,
            tanggal: None,
        };

        let err = repo.add_payment(&id, &bayar(100_001), &admin.id, tanggal(12)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::PaymentExceedsBalance { .. })));

        let after = repo.add_payment(&id, &bayar(60_000), &admin.id, tanggal(12)).await.unwrap();
        assert_eq!(after.header.sisa.rupiah(), 40_000);
        assert_eq!(after.header.status_bayar, StatusBayar::BelumLunas);
        assert_eq!(piutang(&db, &c.id).await, 40_000);

        let lunas = repo.add_payment(&id, &bayar(40_000), &admin.id, tanggal(13)).await.unwrap();
        assert_eq!(lunas.header.status_bayar, StatusBayar::Lunas);
        assert_eq!(lunas.header.dibayar.rupiah(), 120_000);
        assert_eq!(piutang(&db, &c.id).await, 0);
        assert_eq!(repo.payments(&id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_preview_writes_nothing() {
        let (db, _) = setup().await;
        let b = susu(&db, 100, 0).await;

        let p = db
            .penjualan()
            .preview(&tunai(vec![line(&b.id, 0, 6)], 50_000), tanggal(10))
            .await
            .unwrap();
        assert_eq!(p.summary.total.rupiah(), 30_000);
        assert_eq!(p.settlement.kembalian.rupiah(), 20_000);
        assert_eq!(stok(&db, &b.id).await, 100);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, admin) = setup().await;
        let b = susu(&db, 100, 0).await;
        let repo = db.penjualan();

        for d in [9, 10, 11] {
            repo.checkout(&tunai(vec![line(&b.id, 0, 1)], 5_000), &admin.id, tanggal(d))
                .await
                .unwrap();
        }

        let filter = PenjualanFilter {
            dari: Some(tanggal(10)),
            sampai: Some(tanggal(11)),
            ..Default::default()
        };
        let rows = repo.list(&filter).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tanggal, tanggal(11));

        let by_nomor = PenjualanFilter {
            q: Some("20240509".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&by_nomor).await.unwrap().len(), 1);
    }
}
