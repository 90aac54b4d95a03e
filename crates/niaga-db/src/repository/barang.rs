//! # Barang Repository
//!
//! Database operations for the goods catalogue.
//!
//! ## Key Operations
//! - CRUD with soft delete
//! - Manual stock adjustment (stock opname) with an audit row
//! - Low-stock listing for the dashboard
//! - Transaction helpers used by the penjualan and pembelian pipelines
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout / purchase / cancel       →  apply_stock_delta(conn, id, Δ)  │
//! │     UPDATE barang SET stok = stok + Δ WHERE id = ? AND stok + Δ >= 0   │
//! │                                                                         │
//! │  Stock opname (counted on the shelf) →  adjust_stock(id, stok_baru)    │
//! │     absolute value + penyesuaian_stok audit row                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use niaga_core::validation::{
    validate_isi_per_dus, validate_kode, validate_nama, validate_non_negative, validate_price,
    validate_text,
};
use niaga_core::{Barang, CoreError, Money};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, ListFilter};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, kode, nama, satuan, isi_per_dus, harga_beli, harga_jual, stok, \
                       limit_harian, supplier_id, is_active, created_at, updated_at";

/// Input for a new barang.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBarang {
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub satuan: Option<String>,
    #[serde(default = "default_isi")]
    pub isi_per_dus: i64,
    #[serde(default)]
    pub harga_beli: Money,
    #[serde(default)]
    pub harga_jual: Money,
    /// Opening stock in pcs.
    #[serde(default)]
    pub stok: i64,
    #[serde(default)]
    pub limit_harian: i64,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

fn default_isi() -> i64 {
    1
}

/// Editable fields of a barang. Stock is changed through
/// [`BarangRepository::adjust_stock`] or transactions, never here.
#[derive(Debug, Clone, Deserialize)]
pub struct BarangUpdate {
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub satuan: Option<String>,
    pub isi_per_dus: i64,
    pub harga_beli: Money,
    pub harga_jual: Money,
    #[serde(default)]
    pub limit_harian: i64,
    #[serde(default)]
    pub supplier_id: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Audit row written by a stock adjustment.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PenyesuaianStok {
    pub id: String,
    pub barang_id: String,
    pub stok_lama: i64,
    pub stok_baru: i64,
    pub alasan: String,
    pub user_id: String,
    pub created_at: chrono::DateTime<Utc>,
}

fn validate_fields(
    kode: &str,
    nama: &str,
    isi_per_dus: i64,
    harga_beli: Money,
    harga_jual: Money,
    limit_harian: i64,
) -> DbResult<()> {
    validate_kode(kode)?;
    validate_nama(nama)?;
    validate_isi_per_dus(isi_per_dus)?;
    validate_price("harga_beli", harga_beli)?;
    validate_price("harga_jual", harga_jual)?;
    validate_non_negative("limit_harian", limit_harian)?;
    Ok(())
}

/// Repository for barang database operations.
#[derive(Debug, Clone)]
pub struct BarangRepository {
    pool: SqlitePool,
}

impl BarangRepository {
    /// Creates a new BarangRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BarangRepository { pool }
    }

    /// Lists barang matching kode or nama, ordered by nama.
    pub async fn list(&self, filter: &ListFilter) -> DbResult<Vec<Barang>> {
        debug!(q = ?filter.q, "Listing barang");

        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM barang
            WHERE (kode LIKE ?1 ESCAPE '\' OR nama LIKE ?1 ESCAPE '\')
              AND is_active = ?2
            ORDER BY nama
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows = sqlx::query_as::<_, Barang>(&sql)
            .bind(filter.pattern()?)
            .bind(filter.is_active())
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Gets a barang by its ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Barang>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets a barang by its kode.
    pub async fn get_by_kode(&self, kode: &str) -> DbResult<Option<Barang>> {
        let sql = format!("SELECT {COLUMNS} FROM barang WHERE kode = ?1");
        let row = sqlx::query_as::<_, Barang>(&sql)
            .bind(kode.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Inserts a new barang.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - kode already exists
    pub async fn create(&self, input: &NewBarang) -> DbResult<Barang> {
        validate_fields(
            &input.kode,
            &input.nama,
            input.isi_per_dus,
            input.harga_beli,
            input.harga_jual,
            input.limit_harian,
        )?;
        validate_non_negative("stok", input.stok)?;

        let id = generate_id();
        let now = Utc::now();
        debug!(kode = %input.kode, "Inserting barang");

        sqlx::query(
            r#"
            INSERT INTO barang (
                id, kode, nama, satuan, isi_per_dus, harga_beli, harga_jual,
                stok, limit_harian, supplier_id, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
            "#,
        )
        .bind(&id)
        .bind(input.kode.trim())
        .bind(input.nama.trim())
        .bind(input.satuan.as_deref().unwrap_or("pcs"))
        .bind(input.isi_per_dus)
        .bind(input.harga_beli)
        .bind(input.harga_jual)
        .bind(input.stok)
        .bind(input.limit_harian)
        .bind(&input.supplier_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, input.kode.trim()),
            other => other,
        })?;

        info!(id = %id, kode = %input.kode, "Barang created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Barang", &id))
    }

    /// Updates an existing barang.
    pub async fn update(&self, id: &str, input: &BarangUpdate) -> DbResult<Barang> {
        validate_fields(
            &input.kode,
            &input.nama,
            input.isi_per_dus,
            input.harga_beli,
            input.harga_jual,
            input.limit_harian,
        )?;

        debug!(id = %id, "Updating barang");

        let result = sqlx::query(
            r#"
            UPDATE barang SET
                kode = ?2,
                nama = ?3,
                satuan = COALESCE(?4, satuan),
                isi_per_dus = ?5,
                harga_beli = ?6,
                harga_jual = ?7,
                limit_harian = ?8,
                supplier_id = ?9,
                is_active = COALESCE(?10, is_active),
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.kode.trim())
        .bind(input.nama.trim())
        .bind(&input.satuan)
        .bind(input.isi_per_dus)
        .bind(input.harga_beli)
        .bind(input.harga_jual)
        .bind(input.limit_harian)
        .bind(&input.supplier_id)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, input.kode.trim()),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Barang", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Barang", id))
    }

    /// Soft-deletes a barang by setting is_active = false.
    ///
    /// Past notas keep referencing the row.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating barang");

        let result = sqlx::query("UPDATE barang SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Barang", id));
        }

        Ok(())
    }

    /// Sets the stock to a counted value and records the adjustment.
    pub async fn adjust_stock(
        &self,
        id: &str,
        stok_baru: i64,
        alasan: &str,
        user_id: &str,
    ) -> DbResult<Barang> {
        validate_non_negative("stok", stok_baru)?;
        validate_text("alasan", alasan, 200)?;

        let mut tx = self.pool.begin().await?;

        let barang = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Barang", id))?;
        let now = Utc::now();

        sqlx::query("UPDATE barang SET stok = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stok_baru)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO penyesuaian_stok (id, barang_id, stok_lama, stok_baru, alasan, user_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(generate_id())
        .bind(id)
        .bind(barang.stok)
        .bind(stok_baru)
        .bind(alasan.trim())
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let updated = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Barang", id))?;

        tx.commit().await?;

        info!(
            kode = %barang.kode,
            stok_lama = barang.stok,
            stok_baru,
            "Stock adjusted"
        );
        Ok(updated)
    }

    /// Stock adjustments for a barang, newest first.
    pub async fn adjustments(&self, barang_id: &str) -> DbResult<Vec<PenyesuaianStok>> {
        let rows = sqlx::query_as::<_, PenyesuaianStok>(
            r#"
            SELECT id, barang_id, stok_lama, stok_baru, alasan, user_id, created_at
            FROM penyesuaian_stok
            WHERE barang_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(barang_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active barang holding less than one full dus, lowest stock first.
    pub async fn low_stock(&self, limit: i64) -> DbResult<Vec<Barang>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM barang
            WHERE is_active = 1 AND stok < isi_per_dus
            ORDER BY stok, nama
            LIMIT ?1
            "#
        );
        let rows = sqlx::query_as::<_, Barang>(&sql)
            .bind(limit.max(1))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Reads a barang on the given connection (usually an open transaction).
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Barang>> {
    let sql = format!("SELECT {COLUMNS} FROM barang WHERE id = ?1");
    let row = sqlx::query_as::<_, Barang>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Adds `delta` pieces to the stock. A change that would make the stock
/// negative fails with `InsufficientStock` and writes nothing.
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
) -> DbResult<()> {
    if delta == 0 {
        return Ok(());
    }

    let result = sqlx::query(
        "UPDATE barang SET stok = stok + ?2, updated_at = ?3 WHERE id = ?1 AND stok + ?2 >= 0",
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let barang = fetch(conn, id)
            .await?
            .ok_or_else(|| DbError::not_found("Barang", id))?;
        return Err(CoreError::InsufficientStock {
            kode: barang.kode,
            tersedia: barang.stok,
            diminta: -delta,
        }
        .into());
    }

    debug!(id = %id, delta, "Stock updated");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{setup, susu};

    #[tokio::test]
    async fn test_create_and_search() {
        let (db, _) = setup().await;
        let created = susu(&db, 48, 0).await;
        assert_eq!(created.satuan, "kotak");
        assert_eq!(created.stok_kuantitas().dus, 2);

        let found = db.barang().list(&ListFilter::search("uht")).await.unwrap();
        assert_eq!(found.len(), 1);
        let none = db.barang().list(&ListFilter::search("kopi")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_kode_rejected() {
        let (db, _) = setup().await;
        susu(&db, 0, 0).await;
        let err = db
            .barang()
            .create(&NewBarang {
                kode: "SUSU-01".to_string(),
                nama: "Lain".to_string(),
                satuan: None,
                isi_per_dus: 1,
                harga_beli: Money::zero(),
                harga_jual: Money::zero(),
                stok: 0,
                limit_harian: 0,
                supplier_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let (db, _) = setup().await;
        let b = susu(&db, 10, 0).await;

        let updated = db
            .barang()
            .update(
                &b.id,
                &BarangUpdate {
                    kode: b.kode.clone(),
                    nama: "Susu UHT Coklat".to_string(),
                    satuan: None,
                    isi_per_dus: 24,
                    harga_beli: b.harga_beli,
                    harga_jual: Money::from_rupiah(125_000),
                    limit_harian: 48,
                    supplier_id: None,
                    is_active: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.harga_jual.rupiah(), 125_000);
        assert_eq!(updated.stok, 10);
        assert_eq!(updated.satuan, "kotak");

        db.barang().deactivate(&b.id).await.unwrap();
        assert!(db.barang().list(&ListFilter::default()).await.unwrap().is_empty());
        assert!(!db.barang().get_by_id(&b.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_adjust_stock_records_audit() {
        let (db, admin) = setup().await;
        let b = susu(&db, 10, 0).await;

        let after = db
            .barang()
            .adjust_stock(&b.id, 7, "Rusak 3 kotak", &admin.id)
            .await
            .unwrap();
        assert_eq!(after.stok, 7);

        let log = db.barang().adjustments(&b.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!((log[0].stok_lama, log[0].stok_baru), (10, 7));

        assert!(db.barang().adjust_stock(&b.id, -1, "x", &admin.id).await.is_err());
    }

    #[tokio::test]
    async fn test_low_stock() {
        let (db, _) = setup().await;
        susu(&db, 5, 0).await;
        let low = db.barang().low_stock(10).await.unwrap();
        assert_eq!(low.len(), 1);
    }

    #[tokio::test]
    async fn test_stock_delta_never_negative() {
        let (db, _) = setup().await;
        let b = susu(&db, 5, 0).await;
        let mut conn = db.pool().acquire().await.unwrap();

        apply_stock_delta(&mut conn, &b.id, -5).await.unwrap();
        let err = apply_stock_delta(&mut conn, &b.id, -1).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock { tersedia: 0, diminta: 1, .. })
        ));
    }
}
