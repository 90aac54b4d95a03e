//! # niaga-db: Database Layer for Niaga POS
//!
//! This crate provides database access for the Niaga POS back-office.
//! It uses SQLite with sqlx for async operations and owns every SQL
//! statement and every transaction in the system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Niaga POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/penjualan/checkout)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     niaga-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ BarangRepo     │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ PenjualanRepo  │    │ _schema.sql  │  │   │
//! │  │   │ Transactions  │    │ PembelianRepo  │    │              │  │   │
//! │  │   │               │    │ LaporanRepo    │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │          │                     │                                │   │
//! │  │          │                     └── niaga-core (pure math)       │   │
//! │  └──────────┼──────────────────────────────────────────────────────┘   │
//! │             ▼                                                           │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use niaga_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./niaga.db")).await?;
//!
//! let nota = db.penjualan().checkout(&request, &user.id, today).await?;
//! let lr = db.laporan().laba_rugi(&periode).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::SchemaStatus;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::barang::BarangRepository;
pub use repository::customer::CustomerRepository;
pub use repository::karyawan::KaryawanRepository;
pub use repository::laporan::LaporanRepository;
pub use repository::pembelian::PembelianRepository;
pub use repository::pengeluaran::PengeluaranRepository;
pub use repository::penjualan::PenjualanRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::user::UserRepository;
pub use repository::ListFilter;
