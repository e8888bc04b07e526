use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::Envelope;
use crate::admin::{self, parse_id, parse_kind};
use crate::auth::{self, AdminSession};
use crate::db::ImageKind;
use crate::error::{AppError, Result};
use crate::export;
use crate::images;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn to_value<T: serde::Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.to_string()))
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Envelope>> {
    let Json(request) =
        payload.map_err(|_| AppError::Unauthorized(auth::INVALID_CREDENTIALS.to_string()))?;
    let token = auth::login(&state.config, &request.email, &request.password)?;
    tracing::info!("Admin login succeeded");
    Ok(Json(Envelope {
        token: Some(token),
        ..Envelope::ok().with_message("Login Successful")
    }))
}

pub async fn dashboard_stats(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope>> {
    let stats = admin::stats(state.store.as_ref()).await?;
    Ok(Json(Envelope {
        stats: Some(to_value(stats)?),
        ..Envelope::ok()
    }))
}

pub async fn success_users(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope>> {
    let rows = admin::list_success(state.store.as_ref()).await?;
    Ok(Json(Envelope {
        data: Some(to_value(rows)?),
        ..Envelope::ok()
    }))
}

pub async fn failure_users(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope>> {
    let rows = admin::list_failure(state.store.as_ref()).await?;
    Ok(Json(Envelope {
        data: Some(to_value(rows)?),
        ..Envelope::ok()
    }))
}

pub async fn single_image(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path((kind, id, image_type)): Path<(String, String, String)>,
) -> Result<Json<Envelope>> {
    let image_data = admin::fetch_image(
        state.store.as_ref(),
        parse_kind(&kind)?,
        parse_id(&id)?,
        ImageKind::from_param(&image_type),
    )
    .await?;
    Ok(Json(Envelope {
        image_data: Some(image_data),
        ..Envelope::ok()
    }))
}

pub async fn download_image(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path((kind, id, image_type)): Path<(String, String, String)>,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let id = parse_id(&id)?;
    let image = ImageKind::from_param(&image_type);

    let record = admin::find_record(state.store.as_ref(), kind, id).await?;
    let decoded = images::decode_data_url(record.image(image))
        .ok_or_else(|| AppError::NotFound("Image not available".to_string()))?;
    let filename = images::download_name(&record, image, &decoded);

    Ok(attachment(&decoded.mime, &filename, decoded.bytes))
}

pub async fn download_bundle(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let record = admin::find_record(state.store.as_ref(), kind, parse_id(&id)?).await?;
    let bytes = images::build_bundle(kind, &record)?;
    Ok(attachment(
        "application/zip",
        &images::bundle_name(kind, &record),
        bytes,
    ))
}

pub async fn export_records(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let rows = export::rows(state.store.as_ref(), kind).await?;
    let bytes = export::workbook(&rows)?;
    tracing::info!("Exported {} {} records", rows.len(), kind);
    Ok(attachment(
        export::XLSX_CONTENT_TYPE,
        &export::file_name(kind),
        bytes,
    ))
}

pub async fn delete_record(
    _session: AdminSession,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Envelope>> {
    admin::delete(state.store.as_ref(), parse_kind(&kind)?, parse_id(&id)?).await?;
    Ok(Json(Envelope::ok().with_message("Record deleted successfully")))
}
