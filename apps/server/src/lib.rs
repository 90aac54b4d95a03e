//! # Niaga Server
//!
//! HTTP API for the Niaga POS back-office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Niaga Server Routes                            │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  Auth          │  │  Master data   │  │  Transactions              ││
//! │  │                │  │                │  │                            ││
//! │  │ • login        │  │ • barang       │  │ • penjualan (checkout,     ││
//! │  │ • logout       │  │ • customer     │  │   edit, batal, bayar)      ││
//! │  │ • me           │  │ • supplier     │  │ • pembelian                ││
//! │  │                │  │ • karyawan     │  │ • pengeluaran              ││
//! │  │                │  │ • users        │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  Laporan       │  │  Dashboard     │                                │
//! │  │                │  │                │                                │
//! │  │ • JSON         │  │ • today        │                                │
//! │  │ • xlsx export  │  │ • /health      │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  niaga-db    │  │ JWT cookie   │  │    rust_xlsxwriter       ││  │
//! │  │  │  (SQLite)    │  │ sessions     │  │    report workbooks      ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HOST` / `PORT` - Bind address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH` - SQLite file (default: ./niaga.db)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for session signing
//! - `JWT_LIFETIME_SECS` - Session lifetime (default: 43200)
//! - `COOKIE_SECURE` - Mark the session cookie `Secure` (default: false)
//! - `STORE_NAME` - Title on exported reports
//! - `TZ_OFFSET_HOURS` - Business date offset from UTC (default: 7)

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod response;
pub mod routes;

use std::sync::Arc;

use chrono::NaiveDate;
use niaga_db::Database;

// Re-exports
pub use auth::JwtManager;
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use routes::build_router;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub jwt: JwtManager,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> SharedState {
        let jwt = JwtManager::new(&config.jwt_secret, config.jwt_lifetime_secs);
        Arc::new(AppState { db, config, jwt })
    }

    /// Current business date.
    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }
}
