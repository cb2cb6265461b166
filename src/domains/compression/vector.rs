//! Vector compression strategy: stream-optimizing re-save.

use std::io::Cursor;

use lopdf::Document;

use crate::errors::CompressionError;

/// Re-save a vector document with all streams deflated.
///
/// No per-image inspection happens here. Output is deterministic for
/// identical input bytes and library version; the input is never mutated.
pub fn optimize(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut doc = Document::load_mem(data)
        .map_err(|e| CompressionError::InvalidDocument(e.to_string()))?;

    doc.compress();

    let mut output = Cursor::new(Vec::new());
    doc.save_to(&mut output)
        .map_err(|e| CompressionError::Serialize(e.to_string()))?;

    Ok(output.into_inner())
}
