//! Page rendering through the external `pdftoppm` tool (Poppler).

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tempfile::NamedTempFile;
use tokio::task;

use crate::errors::{DomainError, DomainResult};

/// Renders PDF pages to PNG using `pdftoppm`. The executable path is
/// explicit configuration so tests and deployments can point at their own
/// binary instead of whatever is on PATH.
pub struct PageRenderer {
    pdftoppm_path: String,
}

impl PageRenderer {
    pub fn new(pdftoppm_path: Option<String>) -> Self {
        Self {
            pdftoppm_path: pdftoppm_path.unwrap_or_else(|| "pdftoppm".to_string()),
        }
    }

    /// Render every page at the given resolution, returning PNG bytes in
    /// page order.
    pub async fn render_pages(&self, data: Vec<u8>, dpi: u32) -> DomainResult<Vec<Vec<u8>>> {
        let pdftoppm_path = self.pdftoppm_path.clone();

        task::spawn_blocking(move || -> DomainResult<Vec<Vec<u8>>> {
            let mut input_file = NamedTempFile::new()
                .map_err(|e| DomainError::Internal(format!("Failed to create temp file: {}", e)))?;
            input_file
                .write_all(&data)
                .map_err(|e| DomainError::Internal(format!("Failed to write to temp file: {}", e)))?;

            let output_dir = tempfile::tempdir()
                .map_err(|e| DomainError::Internal(format!("Failed to create temp dir: {}", e)))?;
            let prefix = output_dir.path().join("page");

            let output = Command::new(&pdftoppm_path)
                .args(["-png", "-r", &dpi.to_string()])
                .arg(input_file.path())
                .arg(&prefix)
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output()
                .map_err(|e| DomainError::External(format!("Failed to execute pdftoppm: {}", e)))?;

            if !output.status.success() {
                let error = String::from_utf8_lossy(&output.stderr);
                return Err(DomainError::External(format!("pdftoppm error: {}", error)));
            }

            // pdftoppm pads page numbers to a fixed width; sort numerically.
            let mut pages: Vec<(u32, PathBuf)> = Vec::new();
            let entries = fs::read_dir(output_dir.path())
                .map_err(|e| DomainError::Internal(format!("Failed to list rendered pages: {}", e)))?;
            for entry in entries {
                let entry = entry
                    .map_err(|e| DomainError::Internal(format!("Failed to list rendered pages: {}", e)))?;
                let name = entry.file_name().to_string_lossy().to_string();
                if let Some(number) = name
                    .strip_prefix("page-")
                    .and_then(|rest| rest.strip_suffix(".png"))
                    .and_then(|digits| digits.parse::<u32>().ok())
                {
                    pages.push((number, entry.path()));
                }
            }
            pages.sort_by_key(|(number, _)| *number);

            let mut rendered = Vec::with_capacity(pages.len());
            for (_, path) in pages {
                let bytes = fs::read(&path)
                    .map_err(|e| DomainError::Internal(format!("Failed to read rendered page: {}", e)))?;
                rendered.push(bytes);
            }
            Ok(rendered)
        })
        .await
        .map_err(|e| DomainError::Internal(format!("Task join error: {}", e)))?
    }
}
