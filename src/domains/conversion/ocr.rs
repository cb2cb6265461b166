//! Text recognition through the external `tesseract` binary.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::Builder;
use tokio::task;

use crate::errors::{DomainError, DomainResult};

/// OCR engine backed by Tesseract. The executable path is explicit
/// configuration, not a process-wide constant.
pub struct OcrEngine {
    tesseract_path: String,
}

impl OcrEngine {
    pub fn new(tesseract_path: Option<String>) -> Self {
        Self {
            tesseract_path: tesseract_path.unwrap_or_else(|| "tesseract".to_string()),
        }
    }

    /// Recognize the text of one rendered page image (PNG bytes).
    pub async fn recognize(&self, image: Vec<u8>) -> DomainResult<String> {
        let tesseract_path = self.tesseract_path.clone();

        task::spawn_blocking(move || -> DomainResult<String> {
            let mut input_file = Builder::new()
                .suffix(".png")
                .tempfile()
                .map_err(|e| DomainError::Internal(format!("Failed to create temp file: {}", e)))?;
            input_file
                .write_all(&image)
                .map_err(|e| DomainError::Internal(format!("Failed to write to temp file: {}", e)))?;

            let output = Command::new(&tesseract_path)
                .arg(input_file.path())
                .arg("stdout")
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .map_err(|e| DomainError::External(format!("Failed to execute tesseract: {}", e)))?;

            if !output.status.success() {
                let error = String::from_utf8_lossy(&output.stderr);
                return Err(DomainError::External(format!("Tesseract error: {}", error)));
            }

            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
        .await
        .map_err(|e| DomainError::Internal(format!("Task join error: {}", e)))?
    }
}
