//! Type definitions for processed file records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::compression::CompressionStrategy;
use crate::errors::{DomainError, ValidationError};

/// Operation requested for an uploaded PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Render previews, then keep only the selected pages.
    Split,
    /// OCR every page into a DOCX document.
    Convert,
    /// Run the compression policy.
    Compress,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Split => "split",
            Operation::Convert => "convert",
            Operation::Compress => "compress",
        }
    }
}

impl FromStr for Operation {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "split" => Ok(Operation::Split),
            "convert" => Ok(Operation::Convert),
            "compress" => Ok(Operation::Compress),
            _ => Err(DomainError::Validation(ValidationError::invalid_value(
                "operation",
                &format!("unknown operation: {}", s),
            ))),
        }
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        operation.as_str().to_string()
    }
}

/// A stored processing output: the blob plus enough metadata to serve it
/// back. Rows are insert-only; one record per processing run.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: i64,
    pub filename: String,
    pub operation: Operation,
    /// Strategy tag, present only for compression outputs.
    pub strategy: Option<CompressionStrategy>,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Payload for inserting a new file record; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub filename: String,
    pub operation: Operation,
    pub strategy: Option<CompressionStrategy>,
    pub data: Vec<u8>,
}

/// Reference to a stored record, returned to the caller after processing.
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub id: i64,
    pub filename: String,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<CompressionStrategy>,
}

/// Outcome of processing an upload: either a stored record, or the preview
/// step of the split flow awaiting a page selection.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    Stored(StoredFile),
    Preview {
        /// Name the uploaded PDF was stored under; echoed back when
        /// finalizing the split.
        pdf_name: String,
        /// Preview image names, in page order.
        images: Vec<String>,
    },
}

/// Content type for serving a stored file, from its filename extension.
pub fn mime_for_filename(filename: &str) -> &'static str {
    match filename.rsplit('.').next().unwrap_or("").to_lowercase().as_str() {
        "pdf" => "application/pdf",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_round_trips_through_str() {
        for operation in [Operation::Split, Operation::Convert, Operation::Compress] {
            assert_eq!(Operation::from_str(operation.as_str()).unwrap(), operation);
        }
        assert!(Operation::from_str("merge").is_err());
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_for_filename("a_compressed.pdf"), "application/pdf");
        assert_eq!(
            mime_for_filename("scan.DOCX"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_for_filename("noext"), "application/octet-stream");
    }
}
