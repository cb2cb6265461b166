//! Page selection: build a new PDF containing only the chosen pages.

use std::collections::HashSet;
use std::io::Cursor;

use lopdf::Document;

use crate::errors::{DomainError, DomainResult, ValidationError};

/// Produce a PDF holding exactly the selected 1-based page numbers of the
/// input document. Unselected pages are removed, unreferenced objects are
/// dropped and streams are deflated.
pub fn extract_pages(data: &[u8], pages: &[u32]) -> DomainResult<Vec<u8>> {
    let mut doc = Document::load_mem(data)
        .map_err(|e| DomainError::Pdf(format!("Failed to parse PDF: {}", e)))?;

    let total = doc.get_pages().len() as u32;
    let selected: HashSet<u32> = pages.iter().copied().collect();

    if selected.is_empty() {
        return Err(DomainError::Validation(ValidationError::required("pages")));
    }
    if let Some(out_of_range) = selected.iter().find(|page| **page < 1 || **page > total) {
        return Err(DomainError::Validation(ValidationError::invalid_value(
            "pages",
            &format!("page {} out of range 1..={}", out_of_range, total),
        )));
    }

    let removed: Vec<u32> = (1..=total).filter(|page| !selected.contains(page)).collect();
    if !removed.is_empty() {
        doc.delete_pages(&removed);
    }

    doc.prune_objects();
    doc.compress();

    let mut output = Cursor::new(Vec::new());
    doc.save_to(&mut output)
        .map_err(|e| DomainError::Pdf(format!("Failed to save selected pages: {}", e)))?;
    Ok(output.into_inner())
}
