//! Schema provisioning.
//!
//! The schema is declared as a fixed list of idempotent statements rather
//! than a versioned migration history. Running [`apply`] against a fresh or
//! an already-provisioned database yields the same set of objects.

pub mod contract;
pub mod ddl;

use sqlx::migrate::MigrateDatabase;
use sqlx::{PgPool, Postgres};

use crate::error::SchemaError;

pub use contract::verify;

/// Key for the transaction-scoped advisory lock held while provisioning.
///
/// Concurrent provisioners serialize on it, so two `CREATE TYPE` guards can
/// never race each other.
const PROVISION_LOCK_KEY: i64 = 0x6b65_6e5f_7363_6865;

/// Create the target database if it does not exist yet.
///
/// Returns `true` when the database was created by this call.
pub async fn ensure_database(database_url: &str) -> Result<bool, sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        tracing::debug!("Database already exists");
        return Ok(false);
    }
    Postgres::create_database(database_url).await?;
    tracing::info!("Database created");
    Ok(true)
}

/// Ensure the `chat_role` type, all four tables and the `updated_at`
/// trigger exist.
pub async fn provision(pool: &PgPool) -> Result<(), SchemaError> {
    run_locked(pool, ddl::TABLE_STATEMENTS).await
}

/// Ensure the three secondary indexes exist.
pub async fn provision_indexes(pool: &PgPool) -> Result<(), SchemaError> {
    run_locked(pool, ddl::INDEX_STATEMENTS).await
}

/// Provision tables, then indexes.
pub async fn apply(pool: &PgPool) -> Result<(), SchemaError> {
    provision(pool).await?;
    tracing::info!("Schema tables provisioned");
    provision_indexes(pool).await?;
    tracing::info!("Schema indexes provisioned");
    Ok(())
}

/// Execute `statements` in one transaction under the provisioning lock.
///
/// Postgres DDL is transactional: either every statement lands or none do.
async fn run_locked(pool: &PgPool, statements: &[(&str, &str)]) -> Result<(), SchemaError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(PROVISION_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    for (object, statement) in statements {
        tracing::debug!(object, "Ensuring schema object");
        sqlx::raw_sql(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}
