//! Embedded SQL migrations, applied at startup.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::{DbError, DbResult};

// Embed all migration SQL files at compile time
const MIGRATION_FILE_RECORDS: &str = include_str!("../migrations/20250601000000_file_records.sql");

// List of migrations with their names and SQL content, in apply order
const MIGRATIONS: &[(&str, &str)] = &[(
    "20250601000000_file_records.sql",
    MIGRATION_FILE_RECORDS,
)];

/// Apply any migrations that have not run against this database yet.
pub async fn initialize_database(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let applied = applied_migrations(pool).await?;
    for (name, sql) in MIGRATIONS {
        if applied.iter().any(|existing| existing == name) {
            continue;
        }
        log::info!("applying migration {}", name);
        sqlx::raw_sql(sql)
            .execute(pool)
            .await
            .map_err(|e| DbError::Migration(format!("{} failed: {}", name, e)))?;
        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await
            .map_err(|e| DbError::Migration(format!("failed to record {}: {}", name, e)))?;
    }

    Ok(())
}

async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("failed to create migrations table: {}", e)))?;

    Ok(())
}

async fn applied_migrations(pool: &SqlitePool) -> DbResult<Vec<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM migrations ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(|e| DbError::Migration(format!("failed to read applied migrations: {}", e)))
}
