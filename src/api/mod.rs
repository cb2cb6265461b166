//! HTTP surface: thin glue over the document service.

pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::domains::document::DocumentService;
use crate::errors::{DomainError, ServiceError};

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentService>,
}

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Domain(DomainError::EntityNotFound(..)) => StatusCode::NOT_FOUND,
            ServiceError::Domain(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {}", self);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Build the application router with all routes configured.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/process", post(handlers::process))
        .route("/api/split/finalize", post(handlers::finalize_split))
        .route("/api/download/:id", get(handlers::download))
        .route("/uploads/preview/:filename", get(handlers::preview_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
