//! # Supplier Repository
//!
//! Suppliers and their payable (hutang) balance, moved only by the
//! pembelian pipeline.

use chrono::Utc;
use niaga_core::validation::{validate_kode, validate_nama, validate_optional_text};
use niaga_core::{Money, Supplier};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, ListFilter};
use crate::error::{DbError, DbResult};

const COLUMNS: &str = "id, kode, nama, alamat, telepon, hutang, is_active, created_at, updated_at";

/// Input for creating or updating a supplier.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSupplier {
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default)]
    pub telepon: Option<String>,
}

impl NewSupplier {
    fn validate(&self) -> DbResult<()> {
        validate_kode(&self.kode)?;
        validate_nama(&self.nama)?;
        validate_optional_text("alamat", self.alamat.as_deref(), 300)?;
        validate_optional_text("telepon", self.telepon.as_deref(), 30)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn list(&self, filter: &ListFilter) -> DbResult<Vec<Supplier>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM supplier
            WHERE (kode LIKE ?1 ESCAPE '\' OR nama LIKE ?1 ESCAPE '\')
              AND is_active = ?2
            ORDER BY nama
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows = sqlx::query_as::<_, Supplier>(&sql)
            .bind(filter.pattern()?)
            .bind(filter.is_active())
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn create(&self, input: &NewSupplier) -> DbResult<Supplier> {
        input.validate()?;

        let id = generate_id();
        sqlx::query(
            r#"
            INSERT INTO supplier (id, kode, nama, alamat, telepon, hutang, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 0, 1, ?6, ?6)
            "#,
        )
        .bind(&id)
        .bind(input.kode.trim())
        .bind(input.nama.trim())
        .bind(&input.alamat)
        .bind(&input.telepon)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, input.kode.trim()),
            other => other,
        })?;

        info!(id = %id, kode = %input.kode, "Supplier created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", &id))
    }

    pub async fn update(&self, id: &str, input: &NewSupplier) -> DbResult<Supplier> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE supplier SET kode = ?2, nama = ?3, alamat = ?4, telepon = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.kode.trim())
        .bind(input.nama.trim())
        .bind(&input.alamat)
        .bind(&input.telepon)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, input.kode.trim()),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE supplier SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }
        Ok(())
    }
}

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Supplier>> {
    let sql = format!("SELECT {COLUMNS} FROM supplier WHERE id = ?1");
    let row = sqlx::query_as::<_, Supplier>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Moves the supplier's hutang by `delta`.
pub(crate) async fn apply_hutang_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: Money,
) -> DbResult<()> {
    if delta.is_zero() {
        return Ok(());
    }

    let result = sqlx::query(
        "UPDATE supplier SET hutang = MAX(hutang + ?2, 0), updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Supplier", id));
    }

    debug!(id = %id, delta = %delta, "Hutang updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;

    #[tokio::test]
    async fn test_supplier_crud_and_hutang() {
        let (db, _) = setup().await;
        let s = db
            .suppliers()
            .create(&NewSupplier {
                kode: "S-01".to_string(),
                nama: "CV Sumber Rejeki".to_string(),
                alamat: None,
                telepon: Some("0812".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(s.hutang, Money::zero());

        let mut conn = db.pool().acquire().await.unwrap();
        apply_hutang_delta(&mut conn, &s.id, Money::from_rupiah(300_000))
            .await
            .unwrap();
        let s = fetch(&mut conn, &s.id).await.unwrap().unwrap();
        assert_eq!(s.hutang.rupiah(), 300_000);
        drop(conn);

        let found = db.suppliers().list(&ListFilter::search("rejeki")).await.unwrap();
        assert_eq!(found.len(), 1);
    }
}
