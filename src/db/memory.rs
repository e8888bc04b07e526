use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::Mutex;

use super::{
    FailureSummary, NewRecord, RecordDetail, RecordKind, RecordStore, SuccessSummary,
};
use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: i64,
    pub record: NewRecord,
    pub outcome_text: String,
    pub created_at: DateTime<Utc>,
}

/// In-memory `RecordStore` used by tests.
#[derive(Default)]
pub struct MemoryStore {
    pub success: Mutex<Vec<StoredRecord>>,
    pub failure: Mutex<Vec<StoredRecord>>,
    next_success_id: AtomicI64,
    next_failure_id: AtomicI64,
    pub fail_success_inserts: AtomicBool,
    pub fail_failure_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn rows(&self, kind: RecordKind) -> &Mutex<Vec<StoredRecord>> {
        match kind {
            RecordKind::Success => &self.success,
            RecordKind::Failure => &self.failure,
        }
    }

    pub async fn all(&self, kind: RecordKind) -> Vec<StoredRecord> {
        self.rows(kind).lock().await.clone()
    }

    /// Inserts a row with an explicit timestamp.
    pub async fn seed(
        &self,
        kind: RecordKind,
        record: NewRecord,
        outcome_text: &str,
        created_at: DateTime<Utc>,
    ) -> i64 {
        let counter = match kind {
            RecordKind::Success => &self.next_success_id,
            RecordKind::Failure => &self.next_failure_id,
        };
        let id = counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows(kind).lock().await.push(StoredRecord {
            id,
            record,
            outcome_text: outcome_text.to_string(),
            created_at,
        });
        id
    }

    fn newest_first(mut rows: Vec<StoredRecord>) -> Vec<StoredRecord> {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_success(&self, record: &NewRecord, analysis_text: &str) -> Result<i64> {
        if self.fail_success_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database("success insert rejected".to_string()));
        }
        Ok(self
            .seed(RecordKind::Success, record.clone(), analysis_text, Utc::now())
            .await)
    }

    async fn insert_failure(&self, record: &NewRecord, error_message: &str) -> Result<i64> {
        if self.fail_failure_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database("failure insert rejected".to_string()));
        }
        Ok(self
            .seed(RecordKind::Failure, record.clone(), error_message, Utc::now())
            .await)
    }

    async fn count(&self, kind: RecordKind) -> Result<i64> {
        Ok(self.rows(kind).lock().await.len() as i64)
    }

    async fn count_since(&self, kind: RecordKind, since: DateTime<Utc>) -> Result<i64> {
        let rows = self.rows(kind).lock().await;
        Ok(rows.iter().filter(|r| r.created_at >= since).count() as i64)
    }

    async fn list_success(&self) -> Result<Vec<SuccessSummary>> {
        let rows = Self::newest_first(self.all(RecordKind::Success).await);
        Ok(rows
            .into_iter()
            .map(|r| SuccessSummary {
                id: r.id,
                user_ip: r.record.user_ip,
                user_agent: r.record.user_agent,
                user_name: r.record.user_name,
                analysis_text: r.outcome_text,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn list_failure(&self) -> Result<Vec<FailureSummary>> {
        let rows = Self::newest_first(self.all(RecordKind::Failure).await);
        Ok(rows
            .into_iter()
            .map(|r| FailureSummary {
                id: r.id,
                user_ip: r.record.user_ip,
                user_agent: r.record.user_agent,
                user_name: r.record.user_name,
                error_message: r.outcome_text,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn find(&self, kind: RecordKind, id: i64) -> Result<Option<RecordDetail>> {
        let rows = self.rows(kind).lock().await;
        Ok(rows.iter().find(|r| r.id == id).map(|r| RecordDetail {
            id: r.id,
            user_name: r.record.user_name.clone(),
            original_image: r.record.original_image.clone(),
            doctor_image: r.record.doctor_image.clone(),
            outcome_text: r.outcome_text.clone(),
        }))
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool> {
        let mut rows = self.rows(kind).lock().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() != before)
    }
}
