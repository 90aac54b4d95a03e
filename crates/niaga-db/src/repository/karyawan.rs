//! # Karyawan Repository
//!
//! Employees. A sale may name the sales karyawan who closed it; an expense
//! may name the karyawan it was paid to.

use chrono::Utc;
use niaga_core::validation::{validate_nama, validate_optional_text};
use niaga_core::{Jabatan, Karyawan};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use super::{generate_id, ListFilter};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, nama, jabatan, telepon, is_active, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewKaryawan {
    pub nama: String,
    pub jabatan: Jabatan,
    #[serde(default)]
    pub telepon: Option<String>,
}

impl NewKaryawan {
    fn validate(&self) -> DbResult<()> {
        validate_nama(&self.nama)?;
        validate_optional_text("telepon", self.telepon.as_deref(), 30)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct KaryawanRepository {
    pool: SqlitePool,
}

impl KaryawanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KaryawanRepository { pool }
    }

    pub async fn list(&self, filter: &ListFilter) -> DbResult<Vec<Karyawan>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM karyawan
            WHERE nama LIKE ?1 ESCAPE '\' AND is_active = ?2
            ORDER BY nama
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows = sqlx::query_as::<_, Karyawan>(&sql)
            .bind(filter.pattern()?)
            .bind(filter.is_active())
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Karyawan>> {
        let sql = format!("SELECT {COLUMNS} FROM karyawan WHERE id = ?1");
        let row = sqlx::query_as::<_, Karyawan>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn create(&self, input: &NewKaryawan) -> DbResult<Karyawan> {
        input.validate()?;

        let id = generate_id();
        sqlx::query(
            r#"
            INSERT INTO karyawan (id, nama, jabatan, telepon, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(input.nama.trim())
        .bind(input.jabatan)
        .bind(&input.telepon)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(id = %id, jabatan = ?input.jabatan, "Karyawan created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Karyawan", &id))
    }

    pub async fn update(&self, id: &str, input: &NewKaryawan) -> DbResult<Karyawan> {
        input.validate()?;

        let result = sqlx::query(
            "UPDATE karyawan SET nama = ?2, jabatan = ?3, telepon = ?4, updated_at = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(input.nama.trim())
        .bind(input.jabatan)
        .bind(&input.telepon)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Karyawan", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Karyawan", id))
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE karyawan SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Karyawan", id));
        }
        Ok(())
    }
}
