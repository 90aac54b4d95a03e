//! # Pembelian Repository
//!
//! Goods received from suppliers. A purchase raises stock, may move the
//! catalogue buy price, and leaves its unpaid part as supplier hutang.
//!
//! ```text
//!  create                                   cancel
//!  ──────                                   ──────
//!  BEGIN                                    BEGIN
//!   ├── supplier must be active              ├── header must be `selesai`
//!   ├── price lines, settle_purchase         ├── stok −= received pcs
//!   ├── next_nomor("PB", tanggal)            │     (fails if already sold)
//!   ├── INSERT pembelian, pembelian_item     ├── supplier.hutang −= sisa
//!   ├── stok += pcs, harga_beli = latest     └── status = 'batal'
//!   ├── INSERT pembayaran_pembelian         COMMIT
//!   └── supplier.hutang += sisa
//!  COMMIT
//! ```

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use niaga_core::purchase::{
    price_purchase_line, settle_purchase, summarize_purchase, PurchaseLine, PurchaseLineTotals,
};
use niaga_core::validation::validate_optional_text;
use niaga_core::{
    Barang, CoreError, Metode, Money, PembayaranPembelian, PembelianDetail, PembelianHeader,
    PembelianItem, StatusBayar, StatusTransaksi,
};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::barang::{self, apply_stock_delta};
use super::supplier::{self, apply_hutang_delta};
use super::{generate_id, next_nomor, DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::{DbError, DbResult};

const HEADER_COLUMNS: &str = "id, nomor, tanggal, supplier_id, faktur_supplier, total, dibayar, \
     sisa, metode, status_bayar, status, catatan, user_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, pembelian_id, barang_id, kode_barang, nama_barang, isi_per_dus, \
     jumlah_dus, jumlah_pcs, total_pcs, harga_beli, total";

const PAYMENT_COLUMNS: &str =
    "id, pembelian_id, supplier_id, tanggal, jumlah, metode, catatan, user_id, created_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewPembelian {
    pub supplier_id: String,
    #[serde(default)]
    pub faktur_supplier: Option<String>,
    pub items: Vec<PurchaseLine>,
    #[serde(default)]
    pub dibayar: Money,
    #[serde(default)]
    pub metode: Metode,
    #[serde(default)]
    pub catatan: Option<String>,
    /// Copy each line's price to the barang's harga_beli.
    #[serde(default = "default_true")]
    pub update_harga_beli: bool,
    /// Defaults to the current business date.
    #[serde(default)]
    pub tanggal: Option<NaiveDate>,
}

fn default_true() -> bool {
    true
}

/// A payable payment.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPembayaranPembelian {
    pub jumlah: Money,
    #[serde(default)]
    pub metode: Metode,
    #[serde(default)]
    pub catatan: Option<String>,
    #[serde(default)]
    pub tanggal: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PembelianFilter {
    #[serde(default)]
    pub dari: Option<NaiveDate>,
    #[serde(default)]
    pub sampai: Option<NaiveDate>,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub status_bayar: Option<StatusBayar>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

async fn fetch_header(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PembelianHeader>> {
    let sql = format!("SELECT {HEADER_COLUMNS} FROM pembelian WHERE id = ?1");
    let row = sqlx::query_as::<_, PembelianHeader>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn fetch_items(conn: &mut SqliteConnection, id: &str) -> DbResult<Vec<PembelianItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM pembelian_item WHERE pembelian_id = ?1 ORDER BY rowid");
    let rows = sqlx::query_as::<_, PembelianItem>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn fetch_detail(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PembelianDetail>> {
    let Some(header) = fetch_header(conn, id).await? else {
        return Ok(None);
    };
    let supplier_nama = supplier::fetch(conn, &header.supplier_id)
        .await?
        .map(|s| s.nama)
        .unwrap_or_default();
    let items = fetch_items(conn, id).await?;

    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM pembayaran_pembelian WHERE pembelian_id = ?1 ORDER BY created_at"
    );
    let pembayaran = sqlx::query_as::<_, PembayaranPembelian>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(Some(PembelianDetail {
        header,
        supplier_nama,
        items,
        pembayaran,
    }))
}

#[allow(clippy::too_many_arguments)]
async fn insert_payment(
    conn: &mut SqliteConnection,
    pembelian_id: &str,
    supplier_id: &str,
    tanggal: NaiveDate,
    jumlah: Money,
    metode: Metode,
    catatan: Option<&str>,
    user_id: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO pembayaran_pembelian (
            id, pembelian_id, supplier_id, tanggal, jumlah, metode, catatan, user_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(generate_id())
    .bind(pembelian_id)
    .bind(supplier_id)
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

fn ensure_selesai(header: &PembelianHeader) -> DbResult<()> {
    if header.status == StatusTransaksi::Batal {
        return Err(CoreError::InvalidStatus {
            nomor: header.nomor.clone(),
            status: header.status.as_str().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Repository for supplier purchases.
#[derive(Debug, Clone)]
pub struct PembelianRepository {
    pool: SqlitePool,
}

impl PembelianRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PembelianRepository { pool }
    }

    /// Records received goods.
    pub async fn create(
        &self,
        input: &NewPembelian,
        user_id: &str,
        today: NaiveDate,
    ) -> DbResult<PembelianDetail> {
        validate_optional_text("faktur_supplier", input.faktur_supplier.as_deref(), 50)?;
        validate_optional_text("catatan", input.catatan.as_deref(), 500)?;

        let tanggal = input.tanggal.unwrap_or(today);
        let mut tx = self.pool.begin().await?;

        supplier::fetch(&mut tx, &input.supplier_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| CoreError::SupplierNotFound(input.supplier_id.clone()))?;

        let mut lines: Vec<(Barang, PurchaseLineTotals)> = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let barang = barang::fetch(&mut tx, &item.barang_id)
                .await?
                .filter(|b| b.is_active)
                .ok_or_else(|| CoreError::BarangNotFound(item.barang_id.clone()))?;
            let totals = price_purchase_line(item, barang.isi_per_dus, barang.harga_beli)?;
            lines.push((barang, totals));
        }

        let totals: Vec<PurchaseLineTotals> = lines.iter().map(|(_, t)| *t).collect();
        let total = summarize_purchase(&totals)?;
        let settlement = settle_purchase(total, input.dibayar)?;

        let id = generate_id();
        let nomor = next_nomor(&mut tx, "PB", tanggal).await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO pembelian (
                id, nomor, tanggal, supplier_id, faktur_supplier, total, dibayar, sisa,
                metode, status_bayar, status, catatan, user_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'selesai', ?11, ?12, ?13, ?13)
            "#,
        )
        .bind(&id)
        .bind(&nomor)
        .bind(tanggal)
        .bind(&input.supplier_id)
        .bind(&input.faktur_supplier)
        .bind(total)
        .bind(settlement.dibayar)
        .bind(settlement.sisa)
        .bind(input.metode)
        .bind(settlement.status_bayar)
        .bind(&input.catatan)
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (barang, t) in &lines {
            sqlx::query(
                r#"
                INSERT INTO pembelian_item (
                    id, pembelian_id, barang_id, kode_barang, nama_barang, isi_per_dus,
                    jumlah_dus, jumlah_pcs, total_pcs, harga_beli, total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(generate_id())
            .bind(&id)
            .bind(&barang.id)
            .bind(&barang.kode)
            .bind(&barang.nama)
            .bind(barang.isi_per_dus)
            .bind(t.kuantitas.dus)
            .bind(t.kuantitas.pcs)
            .bind(t.total_pcs)
            .bind(t.harga_beli)
            .bind(t.total)
            .execute(&mut *tx)
            .await?;

            apply_stock_delta(&mut tx, &barang.id, t.total_pcs).await?;

            if input.update_harga_beli && t.harga_beli != barang.harga_beli {
                sqlx::query("UPDATE barang SET harga_beli = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(&barang.id)
                    .bind(t.harga_beli)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                debug!(kode = %barang.kode, lama = %barang.harga_beli, baru = %t.harga_beli, "Harga beli updated");
            }
        }

        if settlement.dibayar.is_positive() {
            insert_payment(
                &mut tx,
                &id,
                &input.supplier_id,
                tanggal,
                settlement.dibayar,
                input.metode,
                None,
                user_id,
            )
            .await?;
        }
        apply_hutang_delta(&mut tx, &input.supplier_id, settlement.sisa).await?;

        let detail = fetch_detail(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::not_found("Pembelian", &id))?;

        tx.commit().await?;

        info!(nomor = %nomor, total = %total, sisa = %settlement.sisa, lines = lines.len(), "Pembelian recorded");
        Ok(detail)
    }

    /// Cancels a purchase, taking the received pieces back out of stock.
    pub async fn cancel(&self, id: &str) -> DbResult<PembelianHeader> {
        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Pembelian", id))?;
        ensure_selesai(&header)?;

        let mut received: BTreeMap<String, i64> = BTreeMap::new();
        for item in fetch_items(&mut tx, id).await? {
            *received.entry(item.barang_id).or_insert(0) += item.total_pcs;
        }
        for (barang_id, pcs) in &received {
            apply_stock_delta(&mut tx, barang_id, -pcs).await?;
        }

        apply_hutang_delta(&mut tx, &header.supplier_id, -header.sisa).await?;

        sqlx::query("UPDATE pembelian SET status = 'batal', updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        let cancelled = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Pembelian", id))?;

        tx.commit().await?;

        info!(nomor = %header.nomor, "Pembelian cancelled");
        Ok(cancelled)
    }

    /// Records a payment to the supplier.
    pub async fn add_payment(
        &self,
        id: &str,
        input: &NewPembayaranPembelian,
        user_id: &str,
        today: NaiveDate,
    ) -> DbResult<PembelianDetail> {
        validate_optional_text("catatan", input.catatan.as_deref(), 500)?;

        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Pembelian", id))?;
        ensure_selesai(&header)?;
        niaga_core::checkout::check_payment(input.jumlah, header.sisa)?;

        insert_payment(
            &mut tx,
            id,
            &header.supplier_id,
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
            UPDATE pembelian SET dibayar = dibayar + ?2, sisa = ?3, status_bayar = ?4, updated_at = ?5
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

        apply_hutang_delta(&mut tx, &header.supplier_id, -input.jumlah).await?;

        let detail = fetch_detail(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Pembelian", id))?;

        tx.commit().await?;

        info!(nomor = %header.nomor, jumlah = %input.jumlah, sisa = %sisa, "Hutang payment recorded");
        Ok(detail)
    }

    pub async fn get_detail(&self, id: &str) -> DbResult<Option<PembelianDetail>> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id).await
    }

    pub async fn list(&self, filter: &PembelianFilter) -> DbResult<Vec<PembelianHeader>> {
        let sql = format!(
            r#"
            SELECT {HEADER_COLUMNS}
            FROM pembelian
            WHERE (?1 IS NULL OR tanggal >= ?1)
              AND (?2 IS NULL OR tanggal <= ?2)
              AND (?3 IS NULL OR supplier_id = ?3)
              AND (?4 IS NULL OR status_bayar = ?4)
            ORDER BY tanggal DESC, nomor DESC
            LIMIT ?5 OFFSET ?6
            "#
        );

        let rows = sqlx::query_as::<_, PembelianHeader>(&sql)
            .bind(filter.dari)
            .bind(filter.sampai)
            .bind(&filter.supplier_id)
            .bind(filter.status_bayar)
            .bind(filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
            .bind(filter.offset.unwrap_or(0).max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::penjualan::CheckoutRequest;
    use crate::repository::supplier::NewSupplier;
    use crate::repository::test_support::{setup, susu, tanggal};
    use crate::Database;
    use niaga_core::checkout::CartLine;
    use niaga_core::Supplier;

    async fn grosir(db: &Database) -> Supplier {
        db.suppliers()
            .create(&NewSupplier {
                kode: "S-001".to_string(),
                nama: "CV Sumber Rejeki".to_string(),
                alamat: None,
                telepon: None,
            })
            .await
            .unwrap()
    }

    fn beli(supplier_id: &str, barang_id: &str, dus: i64, harga: i64, dibayar: i64) -> NewPembelian {
        NewPembelian {
            supplier_id: supplier_id.to_string(),
            faktur_supplier: Some("INV-778".to_string()),
            items: vec![PurchaseLine {
                barang_id: barang_id.to_string(),
                jumlah_dus: dus,
                jumlah_pcs: 0,
                harga_beli: Some(Money::from_rupiah(harga)),
            }],
            dibayar: Money::from_rupiah(dibayar),
            metode: Metode::Transfer,
            catatan: None,
            update_harga_beli: true,
            tanggal: None,
        }
    }

    async fn hutang(db: &Database, id: &str) -> i64 {
        db.suppliers().get_by_id(id).await.unwrap().unwrap().hutang.rupiah()
    }

    #[tokio::test]
    async fn test_create_raises_stock_price_and_hutang() {
        let (db, admin) = setup().await;
        let b = susu(&db, 0, 0).await;
        let s = grosir(&db).await;

        let pb = db
            .pembelian()
            .create(&beli(&s.id, &b.id, 10, 98_000, 500_000), &admin.id, tanggal(2))
            .await
            .unwrap();

        assert_eq!(pb.header.nomor, "PB-20240502-0001");
        assert_eq!(pb.header.total.rupiah(), 980_000);
        assert_eq!(pb.header.sisa.rupiah(), 480_000);
        assert_eq!(pb.header.status_bayar, StatusBayar::BelumLunas);
        assert_eq!(pb.supplier_nama, "CV Sumber Rejeki");
        assert_eq!(pb.pembayaran.len(), 1);

        let barang = db.barang().get_by_id(&b.id).await.unwrap().unwrap();
        assert_eq!(barang.stok, 240);
        assert_eq!(barang.harga_beli.rupiah(), 98_000);
        assert_eq!(hutang(&db, &s.id).await, 480_000);
    }

    #[tokio::test]
    async fn test_overpaying_supplier_is_rejected() {
        let (db, admin) = setup().await;
        let b = susu(&db, 0, 0).await;
        let s = grosir(&db).await;

        let err = db
            .pembelian()
            .create(&beli(&s.id, &b.id, 1, 96_000, 100_000), &admin.id, tanggal(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::PaymentExceedsBalance { .. })));
        assert_eq!(db.barang().get_by_id(&b.id).await.unwrap().unwrap().stok, 0);
    }

    #[tokio::test]
    async fn test_cancel_cannot_drive_stock_negative() {
        let (db, admin) = setup().await;
        let b = susu(&db, 0, 0).await;
        let s = grosir(&db).await;

        let pb = db
            .pembelian()
            .create(&beli(&s.id, &b.id, 2, 96_000, 0), &admin.id, tanggal(2))
            .await
            .unwrap();

        // Sell 1 dus of the 2 received
        db.penjualan()
            .checkout(
                &CheckoutRequest {
                    items: vec![CartLine {
                        barang_id: b.id.clone(),
                        jumlah_dus: 1,
                        jumlah_pcs: 0,
                        harga_jual: None,
                        diskon_per_dus: Money::zero(),
                    }],
                    customer_id: None,
                    karyawan_id: None,
                    diskon_nota: Money::zero(),
                    dibayar: Money::from_rupiah(120_000),
                    metode: Metode::Tunai,
                    catatan: None,
                },
                &admin.id,
                tanggal(3),
            )
            .await
            .unwrap();

        let err = db.pembelian().cancel(&pb.header.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { tersedia: 24, diminta: 48, .. })
        ));
        assert_eq!(hutang(&db, &s.id).await, 192_000);
    }

    #[tokio::test]
    async fn test_cancel_and_pay() {
        let (db, admin) = setup().await;
        let b = susu(&db, 0, 0).await;
        let s = grosir(&db).await;
        let repo = db.pembelian();

        let pb = repo
            .create(&beli(&s.id, &b.id, 1, 96_000, 0), &admin.id, tanggal(2))
            .await
            .unwrap();
        let bayar = NewPembayaranPembelian {
            jumlah: Money::from_rupiah(50_000),
            metode: Metode::Tunai,
            catatan: None,
            tanggal: None,
        };
        let after = repo.add_payment(&pb.header.id, &bayar, &admin.id, tanggal(5)).await.unwrap();
        assert_eq!(after.header.sisa.rupiah(), 46_000);
        assert_eq!(after.pembayaran[0].tanggal, tanggal(5));
        assert_eq!(hutang(&db, &s.id).await, 46_000);

        let cancelled = repo.cancel(&pb.header.id).await.unwrap();
        assert_eq!(cancelled.status, StatusTransaksi::Batal);
        assert_eq!(hutang(&db, &s.id).await, 0);
        assert_eq!(db.barang().get_by_id(&b.id).await.unwrap().unwrap().stok, 0);

        let err = repo.add_payment(&pb.header.id, &bayar, &admin.id, tanggal(6)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn test_list_by_supplier() {
        let (db, admin) = setup().await;
        let b = susu(&db, 0, 0).await;
        let s = grosir(&db).await;

        db.pembelian()
            .create(&beli(&s.id, &b.id, 1, 96_000, 96_000), &admin.id, tanggal(2))
            .await
            .unwrap();

        let filter = PembelianFilter {
            supplier_id: Some(s.id.clone()),
            status_bayar: Some(StatusBayar::Lunas),
            ..Default::default()
        };
        assert_eq!(db.pembelian().list(&filter).await.unwrap().len(), 1);
    }
}
