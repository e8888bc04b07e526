mod admin;
mod images;

pub use admin::*;
pub use images::*;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Uniform JSON body for every API response. Absent fields are omitted.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/api/health", get(health))
        .route("/api/images/generate", post(generate_analysis))
        .route("/api/images/stats", get(upload_stats))
        .route("/api/admin/login", post(admin_login))
        .route("/api/admin/stats", get(dashboard_stats))
        .route("/api/admin/success-users", get(success_users))
        .route("/api/admin/failure-users", get(failure_users))
        .route("/api/admin/image/:type/:id/:image_type", get(single_image))
        .route(
            "/api/admin/image/:type/:id/:image_type/download",
            get(download_image),
        )
        .route("/api/admin/bundle/:type/:id", get(download_bundle))
        .route("/api/admin/export/:type", get(export_records))
        .route("/api/admin/delete/:type/:id", delete(delete_record))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn health() -> Json<Envelope> {
    Json(Envelope {
        timestamp: Some(chrono::Utc::now().to_rfc3339()),
        ..Envelope::ok().with_message("Signature Analysis Server is running!")
    })
}

#[cfg(test)]
pub(crate) async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
