//! Document processing service: dispatch an upload to the requested
//! operation and persist the result.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task;

use super::repository::FileRecordRepository;
use super::types::{FileRecord, NewFileRecord, Operation, ProcessOutcome, StoredFile};
use crate::domains::compression::CompressionService;
use crate::domains::conversion::ConvertService;
use crate::domains::core::renderer::PageRenderer;
use crate::domains::core::upload_storage::UploadStorage;
use crate::domains::split;
use crate::errors::{DomainError, ServiceResult, ValidationError};

/// Resolution for split preview rendering.
const PREVIEW_DPI: u32 = 120;

#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Apply the requested operation to an uploaded PDF. Split returns a
    /// preview awaiting page selection; convert and compress store their
    /// output and return the record reference.
    async fn process_upload(
        &self,
        filename: &str,
        operation: Operation,
        data: Vec<u8>,
    ) -> ServiceResult<ProcessOutcome>;

    /// Finish a split: keep only the selected pages of a previously
    /// uploaded PDF and store the result.
    async fn finalize_split(&self, pdf_name: &str, pages: &[u32]) -> ServiceResult<StoredFile>;

    /// Fetch a stored record for download.
    async fn fetch_record(&self, id: i64) -> ServiceResult<FileRecord>;

    /// Fetch a rendered preview image by name.
    async fn fetch_preview(&self, name: &str) -> ServiceResult<Vec<u8>>;
}

pub struct DocumentServiceImpl {
    repo: Arc<dyn FileRecordRepository>,
    compression: Arc<dyn CompressionService>,
    converter: Arc<dyn ConvertService>,
    renderer: Arc<PageRenderer>,
    storage: Arc<UploadStorage>,
}

impl DocumentServiceImpl {
    pub fn new(
        repo: Arc<dyn FileRecordRepository>,
        compression: Arc<dyn CompressionService>,
        converter: Arc<dyn ConvertService>,
        renderer: Arc<PageRenderer>,
        storage: Arc<UploadStorage>,
    ) -> Self {
        Self {
            repo,
            compression,
            converter,
            renderer,
            storage,
        }
    }

    fn validate_upload(data: &[u8]) -> Result<(), ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::required("file"));
        }
        let sniffed = infer::get(data).map(|kind| kind.mime_type());
        if sniffed != Some("application/pdf") {
            return Err(ValidationError::invalid_value(
                "file",
                "uploaded data is not a PDF",
            ));
        }
        Ok(())
    }

    async fn store(&self, record: NewFileRecord) -> ServiceResult<StoredFile> {
        let filename = record.filename.clone();
        let operation = record.operation;
        let strategy = record.strategy;
        let id = self.repo.insert(record).await?;
        log::info!("stored {} output as record {}", operation.as_str(), id);
        Ok(StoredFile {
            id,
            filename,
            operation,
            strategy,
        })
    }
}

/// Build an output filename from the original name's stem.
fn derive_filename(original: &str, suffix: &str, extension: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("document");
    format!("{}{}.{}", stem, suffix, extension)
}

/// Stored upload names carry a UUID prefix; drop it when deriving the
/// user-facing output name.
fn original_stem(stored_name: &str) -> &str {
    stored_name
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(stored_name)
}

#[async_trait]
impl DocumentService for DocumentServiceImpl {
    async fn process_upload(
        &self,
        filename: &str,
        operation: Operation,
        data: Vec<u8>,
    ) -> ServiceResult<ProcessOutcome> {
        Self::validate_upload(&data)?;

        match operation {
            Operation::Split => {
                let pdf_name = self.storage.save_pdf(filename, &data).await?;
                let rendered = self.renderer.render_pages(data, PREVIEW_DPI).await?;

                let mut images = Vec::with_capacity(rendered.len());
                for (index, image) in rendered.iter().enumerate() {
                    let name = format!("{}_{}.png", pdf_name, index);
                    self.storage.save_preview(&name, image).await?;
                    images.push(name);
                }
                Ok(ProcessOutcome::Preview { pdf_name, images })
            }
            Operation::Convert => {
                let output = self.converter.convert_to_docx(data).await?;
                let stored = self
                    .store(NewFileRecord {
                        filename: derive_filename(filename, "", "docx"),
                        operation,
                        strategy: None,
                        data: output,
                    })
                    .await?;
                Ok(ProcessOutcome::Stored(stored))
            }
            Operation::Compress => {
                let outcome = self.compression.compress(data).await?;
                let stored = self
                    .store(NewFileRecord {
                        filename: derive_filename(filename, "_compressed", "pdf"),
                        operation,
                        strategy: Some(outcome.strategy),
                        data: outcome.data,
                    })
                    .await?;
                Ok(ProcessOutcome::Stored(stored))
            }
        }
    }

    async fn finalize_split(&self, pdf_name: &str, pages: &[u32]) -> ServiceResult<StoredFile> {
        let data = self.storage.load_pdf(pdf_name).await?;
        let pages = pages.to_vec();

        let output = task::spawn_blocking(move || split::extract_pages(&data, &pages))
            .await
            .map_err(|e| DomainError::Internal(format!("Task join error: {}", e)))??;

        self.store(NewFileRecord {
            filename: derive_filename(original_stem(pdf_name), "_selected", "pdf"),
            operation: Operation::Split,
            strategy: None,
            data: output,
        })
        .await
    }

    async fn fetch_record(&self, id: i64) -> ServiceResult<FileRecord> {
        Ok(self.repo.find_by_id(id).await?)
    }

    async fn fetch_preview(&self, name: &str) -> ServiceResult<Vec<u8>> {
        Ok(self.storage.load_preview(name).await?)
    }
}
