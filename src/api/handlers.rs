//! Route handlers. No processing logic lives here; everything delegates to
//! the document service.

use std::str::FromStr;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domains::document::{mime_for_filename, Operation, ProcessOutcome, StoredFile};
use crate::errors::{ServiceError, ValidationError};

/// Response for operations that stored an output record.
#[derive(Debug, Serialize)]
pub struct StoredResponse {
    pub id: i64,
    pub filename: String,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
}

impl From<StoredFile> for StoredResponse {
    fn from(stored: StoredFile) -> Self {
        Self {
            id: stored.id,
            filename: stored.filename,
            operation: stored.operation.as_str().to_string(),
            strategy: stored.strategy.map(|s| s.as_str().to_string()),
        }
    }
}

/// Response for the split preview step.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub pdf_name: String,
    pub images: Vec<String>,
}

/// Request body for finalizing a split.
#[derive(Debug, Deserialize)]
pub struct FinalizeSplitRequest {
    pub pdf_name: String,
    pub pages: Vec<u32>,
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "pdfdesk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Upload a PDF and apply one of the three operations to it.
pub async fn process(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut filename = None;
    let mut operation = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(&e.to_string()))?,
                );
            }
            Some("operation") => {
                operation = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error(&e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| ServiceError::from(ValidationError::required("file")))?;
    let operation = operation.ok_or_else(|| {
        ServiceError::from(ValidationError::required("operation"))
    })?;
    let operation = Operation::from_str(&operation)?;
    let filename = filename.unwrap_or_else(|| "upload.pdf".to_string());

    match state
        .documents
        .process_upload(&filename, operation, data.to_vec())
        .await?
    {
        ProcessOutcome::Preview { pdf_name, images } => Ok((
            StatusCode::OK,
            Json(PreviewResponse { pdf_name, images }),
        )
            .into_response()),
        ProcessOutcome::Stored(stored) => {
            Ok((StatusCode::OK, Json(StoredResponse::from(stored))).into_response())
        }
    }
}

/// Keep only the selected pages of a previously uploaded PDF.
pub async fn finalize_split(
    State(state): State<AppState>,
    Json(request): Json<FinalizeSplitRequest>,
) -> Result<Response, ServiceError> {
    let stored = state
        .documents
        .finalize_split(&request.pdf_name, &request.pages)
        .await?;
    Ok((StatusCode::OK, Json(StoredResponse::from(stored))).into_response())
}

/// Serve a stored output blob as a download.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ServiceError> {
    let record = state.documents.fetch_record(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", record.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_for_filename(&record.filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        record.data,
    )
        .into_response())
}

/// Serve a rendered split preview image.
pub async fn preview_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ServiceError> {
    let data = state.documents.fetch_preview(&filename).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png".to_string())],
        data,
    )
        .into_response())
}

fn multipart_error(reason: &str) -> ServiceError {
    ServiceError::from(ValidationError::custom(&format!(
        "failed to read multipart field: {}",
        reason
    )))
}
