use chrono::{DateTime, Local, NaiveTime, Utc};

use crate::db::{
    DashboardStats, FailureSummary, ImageKind, RecordDetail, RecordKind, RecordStore,
    SuccessSummary, UploadStats,
};
use crate::error::{AppError, Result};

pub fn parse_kind(param: &str) -> Result<RecordKind> {
    param
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid type".to_string()))
}

pub fn parse_id(param: &str) -> Result<i64> {
    match param.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest("Invalid record id".to_string())),
    }
}

pub async fn stats(store: &dyn RecordStore) -> Result<DashboardStats> {
    let success = store.count(RecordKind::Success).await?;
    let failure = store.count(RecordKind::Failure).await?;
    Ok(DashboardStats {
        total: success + failure,
        success,
        failure,
    })
}

pub async fn list_success(store: &dyn RecordStore) -> Result<Vec<SuccessSummary>> {
    store.list_success().await
}

pub async fn list_failure(store: &dyn RecordStore) -> Result<Vec<FailureSummary>> {
    store.list_failure().await
}

pub async fn find_record(store: &dyn RecordStore, kind: RecordKind, id: i64) -> Result<RecordDetail> {
    store
        .find(kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".to_string()))
}

pub async fn fetch_image(
    store: &dyn RecordStore,
    kind: RecordKind,
    id: i64,
    image: ImageKind,
) -> Result<String> {
    let record = find_record(store, kind, id).await?;
    let data = record.image(image);
    if data.is_empty() {
        return Err(AppError::NotFound("Image not available".to_string()));
    }
    Ok(data.to_string())
}

pub async fn delete(store: &dyn RecordStore, kind: RecordKind, id: i64) -> Result<()> {
    if store.delete(kind, id).await? {
        tracing::info!("Deleted {} record {}", kind, id);
        Ok(())
    } else {
        Err(AppError::NotFound("Record not found".to_string()))
    }
}

/// Start of the current local calendar day, in UTC.
pub fn local_midnight() -> DateTime<Utc> {
    let now = Local::now();
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

pub async fn upload_stats(store: &dyn RecordStore) -> Result<UploadStats> {
    let total_uploads = store.count(RecordKind::Success).await?;
    let today_uploads = store
        .count_since(RecordKind::Success, local_midnight())
        .await?;
    Ok(UploadStats {
        total_uploads,
        today_uploads,
    })
}
