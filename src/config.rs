//! Application configuration, loaded once from the environment.
//!
//! External tool locations are explicit configuration handed to the
//! components that use them, never process-wide constants.

use std::env;

use crate::errors::{ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string. Required.
    pub database_url: String,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Directory uploaded PDFs and rendered previews live under.
    pub uploads_dir: String,
    /// Tesseract executable; defaults to `tesseract` on PATH.
    pub tesseract_path: Option<String>,
    /// pdftoppm executable (Poppler); defaults to `pdftoppm` on PATH.
    pub pdftoppm_path: Option<String>,
    /// Upper bound on uploaded request bodies.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> ServiceResult<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ServiceError::Configuration("DATABASE_URL not set".to_string()))?;

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            tesseract_path: env::var("TESSERACT_PATH").ok(),
            pdftoppm_path: env::var("PDFTOPPM_PATH").ok(),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(50 * 1024 * 1024),
        })
    }
}
