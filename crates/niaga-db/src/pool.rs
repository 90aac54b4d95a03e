//! # Pool
//!
//! Opens the SQLite file the whole store shares and hands out repositories.
//!
//! ```text
//!   DbConfig ──► Database::new ──► SqlitePool (WAL, foreign keys on)
//!                                      │
//!            ┌─────────────────────────┼──────────────────────────┐
//!            ▼                         ▼                          ▼
//!      read queries            pool.begin() per            migrations on
//!      (lists, reports)        checkout / purchase         first connect
//! ```
//!
//! File databases run in WAL mode so a long report query never stalls the
//! kasir screen.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations::{self, SchemaStatus};
use crate::repository::barang::BarangRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::karyawan::KaryawanRepository;
use crate::repository::laporan::LaporanRepository;
use crate::repository::pembelian::PembelianRepository;
use crate::repository::pengeluaran::PengeluaranRepository;
use crate::repository::penjualan::PenjualanRepository;
use crate::repository::supplier::SupplierRepository;
use crate::repository::user::UserRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the database lives and how many connections it may use.
///
/// ```rust,ignore
/// let config = DbConfig::new("./niaga.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first start. `:memory:` for tests.
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    /// Apply embedded migrations while connecting.
    pub migrate: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        // SQLite serialises writers anyway; one connection is the floor.
        self.max_connections = max.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }

    /// A private in-memory database.
    ///
    /// Limited to one connection: every connection to `:memory:` would be a
    /// separate empty database. Code inside a transaction must therefore use
    /// the transaction's connection, never the pool.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            migrate: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = format!("sqlite://{}?mode=rwc", self.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .create_if_missing(true);

        if self.is_in_memory() {
            return Ok(options);
        }
        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal))
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the store database. Clones share one pool.
///
/// Repositories are built per call and carry a pool handle:
///
/// ```rust,ignore
/// let barang = state.db.barang().get_by_id(&id).await?;
/// let nota = state.db.penjualan().checkout(&request, &user_id, today).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the database, then migrates it when
    /// [`DbConfig::migrate`] is set.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            db.run_migrations().await?;
        }
        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn barang(&self) -> BarangRepository {
        BarangRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn karyawan(&self) -> KaryawanRepository {
        KaryawanRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn pengeluaran(&self) -> PengeluaranRepository {
        PengeluaranRepository::new(self.pool.clone())
    }

    /// Returns the sales repository (checkout/edit pipeline).
    pub fn penjualan(&self) -> PenjualanRepository {
        PenjualanRepository::new(self.pool.clone())
    }

    /// Returns the purchase repository.
    pub fn pembelian(&self) -> PembelianRepository {
        PembelianRepository::new(self.pool.clone())
    }

    /// Returns the report queries.
    pub fn laporan(&self) -> LaporanRepository {
        LaporanRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    pub async fn schema_status(&self) -> DbResult<SchemaStatus> {
        migrations::schema_status(&self.pool).await
    }

    /// `SELECT 1` round trip.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
