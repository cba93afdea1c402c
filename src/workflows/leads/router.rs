use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::repository::LeadRepository;
use super::service::{IntakeConfigSource, LeadIntakeService, LeadServiceError, ReclassifyMode};

/// Router builder exposing the upload and reclassification endpoints.
pub fn lead_router<R, C>(
    service: Arc<LeadIntakeService<R, C>>,
    max_upload_bytes: usize,
) -> Router
where
    R: LeadRepository + 'static,
    C: IntakeConfigSource + 'static,
{
    Router::new()
        .route("/api/v1/leads/upload", post(upload_handler::<R, C>))
        .route("/api/v1/leads/reclassify", post(reclassify_handler::<R, C>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

pub(crate) async fn upload_handler<R, C>(
    State(service): State<Arc<LeadIntakeService<R, C>>>,
    mut multipart: Multipart,
) -> Response
where
    R: LeadRepository + 'static,
    C: IntakeConfigSource + 'static,
{
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let payload = json!({ "success": false, "error": err.to_string() });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload.csv".to_string());
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                let payload = json!({ "success": false, "error": err.to_string() });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        };

        return match service.upload(&file_name, &bytes) {
            Ok(report) => {
                let payload = json!({ "success": true, "data": report });
                (StatusCode::OK, axum::Json(payload)).into_response()
            }
            Err(LeadServiceError::Import(error)) => {
                let payload = json!({ "success": false, "error": error.to_string() });
                (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
            }
            Err(other) => {
                let payload = json!({ "success": false, "error": other.to_string() });
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
            }
        };
    }

    let payload = json!({ "success": false, "error": "multipart field 'file' is required" });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReclassifyRequest {
    pub(crate) mode: ReclassifyMode,
}

pub(crate) async fn reclassify_handler<R, C>(
    State(service): State<Arc<LeadIntakeService<R, C>>>,
    axum::Json(request): axum::Json<ReclassifyRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    C: IntakeConfigSource + 'static,
{
    match service.reclassify(request.mode) {
        Ok(report) => {
            let payload = json!({ "success": true, "data": report });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "success": false, "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
