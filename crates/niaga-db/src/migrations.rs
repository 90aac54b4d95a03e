//! # Schema Migrations
//!
//! The schema ships inside the binary; `migrations/sqlite/NNN_*.sql` at the
//! workspace root is compiled in by `sqlx::migrate!`. Applied versions are
//! tracked in `_sqlx_migrations`.
//!
//! Released files are frozen. A schema change is a new numbered file.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Embedded versus applied migrations, reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub known: usize,
    pub applied: usize,
}

impl SchemaStatus {
    pub fn is_current(&self) -> bool {
        self.applied >= self.known
    }
}

/// Applies whatever has not run yet. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let before = schema_status(pool).await?;
    MIGRATOR.run(pool).await?;
    let after = schema_status(pool).await?;

    if after.applied > before.applied {
        info!(
            applied = after.applied - before.applied,
            total = after.known,
            "Migrations applied"
        );
    }
    Ok(())
}

pub async fn schema_status(pool: &SqlitePool) -> DbResult<SchemaStatus> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;

    let applied: i64 = if tracked == 0 {
        0
    } else {
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await?
    };

    Ok(SchemaStatus {
        known: MIGRATOR.migrations.len(),
        applied: usize::try_from(applied).unwrap_or(0),
    })
}
