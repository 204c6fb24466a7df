//! # Database Migrations
//!
//! The schema ships inside the binary: `sqlx::migrate!` embeds every file
//! under `migrations/sqlite/` at compile time, and [`run_migrations`] applies
//! whatever the target database has not seen yet.
//!
//! To evolve the schema, add a `NNN_description.sql` file with the next
//! sequence number. Applied migration files are checksummed, so existing
//! files must never be edited.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies all pending migrations, in filename order, each in its own
/// transaction. Idempotent; [`crate::Database::new`] calls this on connect
/// unless disabled in the config.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let applied = MIGRATOR.run(pool).await;
    match applied {
        Ok(()) => {
            info!("Database migrations applied");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
