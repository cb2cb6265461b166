//! On-disk storage for uploaded PDFs and rendered page previews.
//!
//! Only the split flow touches this area: the uploaded document has to
//! survive between the preview request and the page-selection request, and
//! preview images are served back by name.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult, ValidationError};

pub struct UploadStorage {
    pdf_dir: PathBuf,
    preview_dir: PathBuf,
}

impl UploadStorage {
    /// Creates the storage rooted at `base_path`, ensuring both
    /// subdirectories exist.
    pub fn new(base_path: &str) -> io::Result<Self> {
        let base = PathBuf::from(base_path);
        let pdf_dir = base.join("pdf");
        let preview_dir = base.join("preview");

        std::fs::create_dir_all(&pdf_dir)?;
        std::fs::create_dir_all(&preview_dir)?;

        Ok(Self {
            pdf_dir,
            preview_dir,
        })
    }

    /// Rejects names that could escape the storage directory.
    fn sanitize(name: &str) -> DomainResult<&str> {
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name == "."
            || name == ".."
        {
            Err(DomainError::Validation(ValidationError::invalid_value(
                "filename",
                "invalid path component",
            )))
        } else {
            Ok(name)
        }
    }

    /// Store an uploaded PDF under a unique name derived from the original
    /// filename; returns the stored name used by later requests.
    pub async fn save_pdf(&self, suggested_filename: &str, data: &[u8]) -> DomainResult<String> {
        let stem = Path::new(suggested_filename)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload.pdf");
        let stored_name = format!("{}_{}", Uuid::new_v4(), stem);
        Self::sanitize(&stored_name)?;

        fs::write(self.pdf_dir.join(&stored_name), data)
            .await
            .map_err(|e| DomainError::File(format!("Failed to store uploaded PDF: {}", e)))?;
        Ok(stored_name)
    }

    pub async fn load_pdf(&self, stored_name: &str) -> DomainResult<Vec<u8>> {
        let name = Self::sanitize(stored_name)?;
        match fs::read(self.pdf_dir.join(name)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DomainError::EntityNotFound(
                "uploaded PDF".to_string(),
                name.to_string(),
            )),
            Err(e) => Err(DomainError::File(format!(
                "Failed to read uploaded PDF: {}",
                e
            ))),
        }
    }

    pub async fn save_preview(&self, name: &str, data: &[u8]) -> DomainResult<()> {
        let name = Self::sanitize(name)?;
        fs::write(self.preview_dir.join(name), data)
            .await
            .map_err(|e| DomainError::File(format!("Failed to store preview image: {}", e)))
    }

    pub async fn load_preview(&self, name: &str) -> DomainResult<Vec<u8>> {
        let name = Self::sanitize(name)?;
        match fs::read(self.preview_dir.join(name)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DomainError::EntityNotFound(
                "preview image".to_string(),
                name.to_string(),
            )),
            Err(e) => Err(DomainError::File(format!(
                "Failed to read preview image: {}",
                e
            ))),
        }
    }
}
