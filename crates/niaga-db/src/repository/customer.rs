//! # Customer Repository
//!
//! Customers and their receivable (piutang) balance. The balance is only
//! moved by the penjualan pipeline through [`apply_piutang_delta`].

use chrono::Utc;
use niaga_core::validation::{validate_kode, validate_nama, validate_optional_text, validate_price};
use niaga_core::{Customer, Money};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, ListFilter};
use crate::error::{DbError, DbResult};

const COLUMNS: &str =
    "id, kode, nama, alamat, telepon, limit_piutang, piutang, is_active, created_at, updated_at";

/// Input for creating or updating a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomer {
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default)]
    pub telepon: Option<String>,
    /// Zero means unlimited.
    #[serde(default)]
    pub limit_piutang: Money,
}

impl NewCustomer {
    fn validate(&self) -> DbResult<()> {
        validate_kode(&self.kode)?;
        validate_nama(&self.nama)?;
        validate_optional_text("alamat", self.alamat.as_deref(), 300)?;
        validate_optional_text("telepon", self.telepon.as_deref(), 30)?;
        validate_price("limit_piutang", self.limit_piutang)?;
        Ok(())
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn list(&self, filter: &ListFilter) -> DbResult<Vec<Customer>> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
            FROM customer
            WHERE (kode LIKE ?1 ESCAPE '\' OR nama LIKE ?1 ESCAPE '\')
              AND is_active = ?2
            ORDER BY nama
            LIMIT ?3 OFFSET ?4
            "#
        );

        let rows = sqlx::query_as::<_, Customer>(&sql)
            .bind(filter.pattern()?)
            .bind(filter.is_active())
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn create(&self, input: &NewCustomer) -> DbResult<Customer> {
        input.validate()?;

        let id = generate_id();
        debug!(kode = %input.kode, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customer (
                id, kode, nama, alamat, telepon, limit_piutang, piutang,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1, ?7, ?7)
            "#,
        )
        .bind(&id)
        .bind(input.kode.trim())
        .bind(input.nama.trim())
        .bind(&input.alamat)
        .bind(&input.telepon)
        .bind(input.limit_piutang)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, input.kode.trim()),
            other => other,
        })?;

        info!(id = %id, kode = %input.kode, "Customer created");
        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &id))
    }

    /// Updates master fields. The piutang balance is never written here.
    pub async fn update(&self, id: &str, input: &NewCustomer) -> DbResult<Customer> {
        input.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE customer SET
                kode = ?2, nama = ?3, alamat = ?4, telepon = ?5,
                limit_piutang = ?6, updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.kode.trim())
        .bind(input.nama.trim())
        .bind(&input.alamat)
        .bind(&input.telepon)
        .bind(input.limit_piutang)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, input.kode.trim()),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Soft delete.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE customer SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }
}

/// Reads a customer on the given connection.
pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {COLUMNS} FROM customer WHERE id = ?1");
    let row = sqlx::query_as::<_, Customer>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Moves the customer's piutang by `delta`.
pub(crate) async fn apply_piutang_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: Money,
) -> DbResult<()> {
    if delta.is_zero() {
        return Ok(());
    }

    let result = sqlx::query(
        "UPDATE customer SET piutang = MAX(piutang + ?2, 0), updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", id));
    }

    debug!(id = %id, delta = %delta, "Piutang updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{setup, toko};

    #[tokio::test]
    async fn test_customer_crud() {
        let (db, _) = setup().await;
        let c = toko(&db, 500_000).await;
        assert_eq!(c.piutang, Money::zero());

        let updated = db
            .customers()
            .update(
                &c.id,
                &NewCustomer {
                    kode: c.kode.clone(),
                    nama: "Toko Maju Jaya".to_string(),
                    alamat: Some("Jl. Pasar 1".to_string()),
                    telepon: None,
                    limit_piutang: Money::from_rupiah(1_000_000),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nama, "Toko Maju Jaya");
        assert_eq!(updated.limit_piutang.rupiah(), 1_000_000);

        let found = db.customers().list(&ListFilter::search("jaya")).await.unwrap();
        assert_eq!(found.len(), 1);

        db.customers().deactivate(&c.id).await.unwrap();
        assert!(db.customers().list(&ListFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_piutang_delta() {
        let (db, _) = setup().await;
        let c = toko(&db, 0).await;
        let mut conn = db.pool().acquire().await.unwrap();

        apply_piutang_delta(&mut conn, &c.id, Money::from_rupiah(75_000))
            .await
            .unwrap();
        apply_piutang_delta(&mut conn, &c.id, Money::from_rupiah(-25_000))
            .await
            .unwrap();
        let c = fetch(&mut conn, &c.id).await.unwrap().unwrap();
        assert_eq!(c.piutang.rupiah(), 50_000);
    }
}
