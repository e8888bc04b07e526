use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::Envelope;
use crate::error::AppError;
use crate::state::AppState;
use crate::submission::{self, RequestMeta, SubmissionOutcome, SubmissionRequest};

const NO_TEXT_MESSAGE: &str = "AI could not analyze the signature. Please try again.";

fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    RequestMeta {
        forwarded_for: header("x-forwarded-for"),
        user_agent: header("user-agent"),
    }
}

pub async fn generate_analysis(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SubmissionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            return AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
                .into_response()
        }
    };

    let record = match submission::validate(request, request_meta(&headers)) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    match submission::submit(state.store.as_ref(), state.gateway.as_ref(), record).await {
        SubmissionOutcome::Analyzed {
            analysis_text,
            upload_id,
        } => Json(Envelope {
            analysis_text: Some(analysis_text),
            upload_id: Some(upload_id),
            ..Envelope::ok()
        })
        .into_response(),
        SubmissionOutcome::NoText => Json(Envelope::failure(NO_TEXT_MESSAGE)).into_response(),
        SubmissionOutcome::Failed { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Envelope::failure(format!("Processing error: {}", message))),
        )
            .into_response(),
    }
}

pub async fn upload_stats(State(state): State<Arc<AppState>>) -> Result<Json<Envelope>, AppError> {
    let stats = crate::admin::upload_stats(state.store.as_ref()).await?;
    Ok(Json(Envelope {
        stats: Some(serde_json::to_value(stats).map_err(|e| AppError::Internal(e.to_string()))?),
        ..Envelope::ok()
    }))
}
