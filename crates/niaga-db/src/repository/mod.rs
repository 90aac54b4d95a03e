//! # Repository Module
//!
//! Database repository implementations for Niaga POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.barang().list(&filter)                               │
//! │       ▼                                                                 │
//! │  Master data (pool)            Transactions (pool.begin())             │
//! │  ├── BarangRepository          ├── PenjualanRepository                 │
//! │  ├── CustomerRepository        │     checkout / edit / cancel / bayar  │
//! │  ├── SupplierRepository        └── PembelianRepository                 │
//! │  ├── KaryawanRepository              create / cancel / bayar           │
//! │  ├── UserRepository                                                    │
//! │  └── PengeluaranRepository     Reads                                   │
//! │                                └── LaporanRepository                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod barang;
pub mod customer;
pub mod karyawan;
pub mod laporan;
pub mod pembelian;
pub mod pengeluaran;
pub mod penjualan;
pub mod supplier;
pub mod user;

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::SqliteConnection;
use niaga_core::validation::validate_search_query;
use uuid::Uuid;

use crate::error::DbResult;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: i64 = 50;

/// Hard cap on page size.
pub const MAX_LIMIT: i64 = 500;

/// Common filter for master-data lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    /// Matches kode or nama (substring, case-insensitive for ASCII).
    #[serde(default)]
    pub q: Option<String>,
    /// `None` lists active rows only; `Some(false)` lists inactive rows.
    #[serde(default)]
    pub aktif: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListFilter {
    pub fn search(q: impl Into<String>) -> Self {
        ListFilter {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    /// `%q%` for LIKE, or `%` when no query was given.
    pub(crate) fn pattern(&self) -> DbResult<String> {
        like_pattern(self.q.as_deref())
    }

    pub(crate) fn is_active(&self) -> bool {
        self.aktif.unwrap_or(true)
    }

    pub(crate) fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub(crate) fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Builds a LIKE pattern, escaping the wildcard characters in user input.
pub(crate) fn like_pattern(q: Option<&str>) -> DbResult<String> {
    let q = validate_search_query(q.unwrap_or_default())?;
    if q.is_empty() {
        return Ok("%".to_string());
    }
    let escaped = q
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Ok(format!("%{escaped}%"))
}

/// Generates a new row id.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Allocates the next document number for a business date, e.g.
/// `PJ-20240510-0007`. Must run inside the transaction that inserts the
/// document so that a rollback also releases the number.
pub(crate) async fn next_nomor(
    conn: &mut SqliteConnection,
    prefix: &str,
    tanggal: NaiveDate,
) -> DbResult<String> {
    let urut: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO nomor_urut (prefix, tanggal, terakhir) VALUES (?1, ?2, 1)
        ON CONFLICT (prefix, tanggal) DO UPDATE SET terakhir = terakhir + 1
        RETURNING terakhir
        "#,
    )
    .bind(prefix)
    .bind(tanggal)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format_nomor(prefix, tanggal, urut))
}

pub(crate) fn format_nomor(prefix: &str, tanggal: NaiveDate, urut: i64) -> String {
    format!("{}-{}-{:04}", prefix, tanggal.format("%Y%m%d"), urut)
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use niaga_core::{Barang, Customer, Money, Role, User};

    use super::barang::NewBarang;
    use super::customer::NewCustomer;
    use super::user::NewUser;
    use crate::{Database, DbConfig};

    pub async fn setup() -> (Database, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let admin = db
            .users()
            .create(&NewUser {
                username: "admin".to_string(),
                password: "rahasia123".to_string(),
                role: Role::Admin,
                karyawan_id: None,
            })
            .await
            .unwrap();
        (db, admin)
    }

    pub fn tanggal(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    /// Susu UHT: isi 24, beli 96.000, jual 120.000 per dus.
    pub async fn susu(db: &Database, stok: i64, limit_harian: i64) -> Barang {
        db.barang()
            .create(&NewBarang {
                kode: "SUSU-01".to_string(),
                nama: "Susu UHT 200ml".to_string(),
                satuan: Some("kotak".to_string()),
                isi_per_dus: 24,
                harga_beli: Money::from_rupiah(96_000),
                harga_jual: Money::from_rupiah(120_000),
                stok,
                limit_harian,
                supplier_id: None,
            })
            .await
            .unwrap()
    }

    pub async fn toko(db: &Database, limit_piutang: i64) -> Customer {
        db.customers()
            .create(&NewCustomer {
                kode: "C-001".to_string(),
                nama: "Toko Maju".to_string(),
                alamat: None,
                telepon: None,
                limit_piutang: Money::from_rupiah(limit_piutang),
            })
            .await
            .unwrap()
    }
}
