//! # Pengeluaran Repository
//!
//! Operating expenses (listrik, gaji, transport, ...). Expenses have no
//! dependents, so delete is a hard delete.

use chrono::{NaiveDate, Utc};
use niaga_core::validation::{validate_payment_amount, validate_text};
use niaga_core::{Money, Pengeluaran};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::{generate_id, DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::{DbError, DbResult};

const COLUMNS: &str =
    "id, tanggal, kategori, keterangan, jumlah, karyawan_id, user_id, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewPengeluaran {
    /// Defaults to the current business date.
    #[serde(default)]
    pub tanggal: Option<NaiveDate>,
    pub kategori: String,
    pub keterangan: String,
    pub jumlah: Money,
    #[serde(default)]
    pub karyawan_id: Option<String>,
}

impl NewPengeluaran {
    fn validate(&self) -> DbResult<()> {
        validate_text("kategori", &self.kategori, 50)?;
        validate_text("keterangan", &self.keterangan, 300)?;
        validate_payment_amount(self.jumlah)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PengeluaranFilter {
    #[serde(default)]
    pub dari: Option<NaiveDate>,
    #[serde(default)]
    pub sampai: Option<NaiveDate>,
    #[serde(default)]
    pub kategori: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PengeluaranRepository {
    pool: SqlitePool,
}

impl PengeluaranRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PengeluaranRepository { pool }
    }

    /// Lists expenses, newest business date first.
    pub async fn list(&self, filter: &PengeluaranFilter) -> DbResult<Vec<Pengeluaran>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM pengeluaran
            WHERE (?1 IS NULL OR tanggal >= ?1)
              AND (?2 IS NULL OR tanggal <= ?2)
              AND (?3 IS NULL OR kategori = ?3)
            ORDER BY tanggal DESC, created_at DESC
            LIMIT ?4 OFFSET ?5
            "#
        );

        let rows = sqlx::query_as::<_, Pengeluaran>(&sql)
            .bind(filter.dari)
            .bind(filter.sampai)
            .bind(&filter.kategori)
            .bind(filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT))
            .bind(filter.offset.unwrap_or(0).max(0))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Pengeluaran>> {
        let sql = format!("SELECT {COLUMNS} FROM pengeluaran WHERE id = ?1");
        let row = sqlx::query_as::<_, Pengeluaran>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(
        &self,
        input: &NewPengeluaran,
        user_id: &str,
        today: NaiveDate,
    ) -> DbResult<Pengeluaran> {
        input.validate()?;

        let id = generate_id();
        let tanggal = input.tanggal.unwrap_or(today);

        sqlx::query(
            r#"
            INSERT INTO pengeluaran (
                id, tanggal, kategori, keterangan, jumlah, karyawan_id, user_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            "#,
        )
        .bind(&id)
        .bind(tanggal)
        .bind(input.kategori.trim())
        .bind(input.keterangan.trim())
        .bind(input.jumlah)
        .bind(&input.karyawan_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(id = %id, kategori = %input.kategori, jumlah = %input.jumlah, "Pengeluaran recorded");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Pengeluaran", &id))
    }

    pub async fn update(
        &self,
        id: &str,
        input: &NewPengeluaran,
        today: NaiveDate,
    ) -> DbResult<Pengeluaran> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE pengeluaran SET
                tanggal = ?2, kategori = ?3, keterangan = ?4, jumlah = ?5,
                karyawan_id = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.tanggal.unwrap_or(today))
        .bind(input.kategori.trim())
        .bind(input.keterangan.trim())
        .bind(input.jumlah)
        .bind(&input.karyawan_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pengeluaran", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Pengeluaran", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM pengeluaran WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pengeluaran", id));
        }
        info!(id = %id, "Pengeluaran deleted");
        Ok(())
    }
}
