#[cfg(test)]
pub mod memory;
mod models;

pub use models::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::Result;

/// Row operations over the success and failure tables.
///
/// Every method is a single statement; the store assigns ids and timestamps.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_success(&self, record: &NewRecord, analysis_text: &str) -> Result<i64>;

    async fn insert_failure(&self, record: &NewRecord, error_message: &str) -> Result<i64>;

    async fn count(&self, kind: RecordKind) -> Result<i64>;

    async fn count_since(&self, kind: RecordKind, since: DateTime<Utc>) -> Result<i64>;

    /// Newest first, image columns excluded.
    async fn list_success(&self) -> Result<Vec<SuccessSummary>>;

    /// Newest first, image columns excluded.
    async fn list_failure(&self) -> Result<Vec<FailureSummary>>;

    async fn find(&self, kind: RecordKind, id: i64) -> Result<Option<RecordDetail>>;

    /// Returns whether a row was removed.
    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool>;
}

pub async fn create_pool(database_url: &str) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Success => "success_records",
        RecordKind::Failure => "failure_records",
    }
}

fn outcome_column(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Success => "analysis_text",
        RecordKind::Failure => "error_message",
    }
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, kind: RecordKind, record: &NewRecord, outcome: &str) -> Result<i64> {
        let sql = format!(
            r#"
            INSERT INTO {} (user_ip, user_agent, user_name, original_image, doctor_image, {})
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
            table(kind),
            outcome_column(kind)
        );
        let id: i64 = sqlx::query_scalar(&sql)
            .bind(&record.user_ip)
            .bind(&record.user_agent)
            .bind(&record.user_name)
            .bind(&record.original_image)
            .bind(&record.doctor_image)
            .bind(outcome)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert_success(&self, record: &NewRecord, analysis_text: &str) -> Result<i64> {
        self.insert(RecordKind::Success, record, analysis_text).await
    }

    async fn insert_failure(&self, record: &NewRecord, error_message: &str) -> Result<i64> {
        self.insert(RecordKind::Failure, record, error_message).await
    }

    async fn count(&self, kind: RecordKind) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table(kind));
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn count_since(&self, kind: RecordKind, since: DateTime<Utc>) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE created_at >= $1", table(kind));
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_success(&self) -> Result<Vec<SuccessSummary>> {
        let rows = sqlx::query_as::<_, SuccessSummary>(
            r#"
            SELECT id, user_ip, user_agent, user_name, analysis_text, created_at
            FROM success_records
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_failure(&self) -> Result<Vec<FailureSummary>> {
        let rows = sqlx::query_as::<_, FailureSummary>(
            r#"
            SELECT id, user_ip, user_agent, user_name, error_message, created_at
            FROM failure_records
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find(&self, kind: RecordKind, id: i64) -> Result<Option<RecordDetail>> {
        let sql = format!(
            r#"
            SELECT id, user_name, original_image, doctor_image, {} AS outcome_text
            FROM {}
            WHERE id = $1
            "#,
            outcome_column(kind),
            table(kind)
        );
        let row = sqlx::query_as::<_, RecordDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table(kind));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}
