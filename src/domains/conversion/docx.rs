//! DOCX assembly from recognized page text.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};

use crate::errors::{DomainError, DomainResult};

/// Build a DOCX document from per-page text, one paragraph per line.
pub fn build_docx(pages: &[String]) -> DomainResult<Vec<u8>> {
    let mut docx = Docx::new();
    for text in pages {
        for line in text.lines() {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
    }

    let mut output = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut output)
        .map_err(|e| DomainError::Internal(format!("Failed to assemble DOCX: {}", e)))?;
    Ok(output.into_inner())
}
