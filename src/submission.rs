use serde::Deserialize;
use tracing::{error, info, warn};

use crate::agents::AnalysisGateway;
use crate::db::{NewRecord, RecordStore};
use crate::error::{AppError, Result};

pub const DEFAULT_USER_NAME: &str = "Unknown User";
pub const UNKNOWN_IP: &str = "unknown";
pub const NO_TEXT_ERROR: &str = "API returned no analysis text";
pub const SIGNATURE_PLACEHOLDER: &str = "Image upload failed";
pub const DOCTOR_PLACEHOLDER: &str = "Doctor image upload failed";
pub const STORE_ERROR_MESSAGE: &str = "Could not save the analysis result";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(alias = "image")]
    pub signature_image: Option<String>,
    pub doctor_image: Option<String>,
    pub user_name: Option<String>,
    pub user_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Provenance taken from the transport when the body does not carry it.
#[derive(Debug, Default, Clone)]
pub struct RequestMeta {
    pub forwarded_for: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Analyzed { analysis_text: String, upload_id: i64 },
    NoText,
    Failed { message: String },
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Checks both images and fills provenance defaults.
pub fn validate(request: SubmissionRequest, meta: RequestMeta) -> Result<NewRecord> {
    let original_image = present(request.signature_image)
        .ok_or_else(|| AppError::BadRequest("Signature image is required".to_string()))?;
    let doctor_image = present(request.doctor_image)
        .ok_or_else(|| AppError::BadRequest("Doctor photo is required".to_string()))?;

    let user_ip = present(request.user_ip)
        .or_else(|| {
            meta.forwarded_for
                .as_deref()
                .and_then(|h| h.split(',').next())
                .map(|ip| ip.trim().to_string())
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or_else(|| UNKNOWN_IP.to_string());

    Ok(NewRecord {
        user_ip,
        user_agent: present(request.user_agent).or(meta.user_agent),
        user_name: present(request.user_name)
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
        original_image,
        doctor_image,
    })
}

/// Runs one analysis and writes exactly one record for it.
///
/// The gateway is always called before any write. Store errors on the
/// success or no-text path are treated like gateway errors.
pub async fn submit(
    store: &dyn RecordStore,
    gateway: &dyn AnalysisGateway,
    record: NewRecord,
) -> SubmissionOutcome {
    let analysis = match gateway.analyze_signature(&record.original_image).await {
        Ok(analysis) => analysis,
        Err(e) => {
            error!("Signature analysis failed for {}: {}", record.user_name, e);
            let message = e.to_string();
            return record_failure(store, record, &message, message.clone()).await;
        }
    };

    match analysis {
        Some(analysis_text) => match store.insert_success(&record, &analysis_text).await {
            Ok(upload_id) => {
                info!("Stored analysis {} for {}", upload_id, record.user_name);
                SubmissionOutcome::Analyzed {
                    analysis_text,
                    upload_id,
                }
            }
            Err(e) => {
                error!("Failed to store analysis for {}: {}", record.user_name, e);
                record_failure(store, record, &e.to_string(), STORE_ERROR_MESSAGE.to_string())
                    .await
            }
        },
        None => match store.insert_failure(&record, NO_TEXT_ERROR).await {
            Ok(id) => {
                warn!("Analysis service returned no text; failure record {}", id);
                SubmissionOutcome::NoText
            }
            Err(e) => {
                error!("Failed to store no-text failure for {}: {}", record.user_name, e);
                SubmissionOutcome::Failed {
                    message: STORE_ERROR_MESSAGE.to_string(),
                }
            }
        },
    }
}

/// Best-effort failure write of `stored_message`; the caller always gets
/// `message` back, even when the write fails.
async fn record_failure(
    store: &dyn RecordStore,
    mut record: NewRecord,
    stored_message: &str,
    message: String,
) -> SubmissionOutcome {
    if record.original_image.is_empty() {
        record.original_image = SIGNATURE_PLACEHOLDER.to_string();
    }
    if record.doctor_image.is_empty() {
        record.doctor_image = DOCTOR_PLACEHOLDER.to_string();
    }

    if let Err(db_err) = store.insert_failure(&record, stored_message).await {
        error!("Critical: failed to save failure record: {}", db_err);
    }
    SubmissionOutcome::Failed { message }
}
