//! Repository for processed file records (blob-in-row content store).

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use super::types::{FileRecord, NewFileRecord, Operation};
use crate::domains::compression::CompressionStrategy;
use crate::errors::{DbError, DomainError, DomainResult};

/// Content-store interface: put bytes, get them back by the id assigned at
/// creation. Records are immutable once written.
#[async_trait]
pub trait FileRecordRepository: Send + Sync {
    async fn insert(&self, record: NewFileRecord) -> DomainResult<i64>;
    async fn find_by_id(&self, id: i64) -> DomainResult<FileRecord>;
}

pub struct SqliteFileRecordRepository {
    pool: SqlitePool,
}

impl SqliteFileRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_row(row: &sqlx::sqlite::SqliteRow) -> DomainResult<FileRecord> {
        let id: i64 = row.try_get("id").map_err(DbError::from)?;
        let filename: String = row.try_get("filename").map_err(DbError::from)?;
        let operation: String = row.try_get("operation").map_err(DbError::from)?;
        let strategy: Option<String> = row.try_get("strategy").map_err(DbError::from)?;
        let data: Vec<u8> = row.try_get("file_data").map_err(DbError::from)?;
        let created_at: String = row.try_get("created_at").map_err(DbError::from)?;

        Ok(FileRecord {
            id,
            filename,
            operation: Operation::from_str(&operation)?,
            strategy: strategy
                .as_deref()
                .map(CompressionStrategy::from_str)
                .transpose()?,
            data,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DbError::Other(format!("Invalid created_at timestamp: {}", e)))?,
        })
    }
}

#[async_trait]
impl FileRecordRepository for SqliteFileRecordRepository {
    async fn insert(&self, record: NewFileRecord) -> DomainResult<i64> {
        let result = sqlx::query(
            "INSERT INTO file_records (filename, operation, strategy, file_data, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.filename)
        .bind(record.operation.as_str())
        .bind(record.strategy.map(|s| s.as_str()))
        .bind(&record.data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> DomainResult<FileRecord> {
        let row = sqlx::query(
            "SELECT id, filename, operation, strategy, file_data, created_at
             FROM file_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        match row {
            Some(row) => Self::map_row(&row),
            None => Err(DomainError::EntityNotFound(
                "file_record".to_string(),
                id.to_string(),
            )),
        }
    }
}
