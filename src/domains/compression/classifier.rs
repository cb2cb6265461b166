//! Document classification: vector vs scanned.

use lopdf::{Document, Object};

use super::types::DocumentClass;

/// Classify a PDF byte stream.
///
/// Returns `Vector` if any page exposes a non-empty content stream, else
/// `Scanned`. Total: any structural-inspection failure (unreadable file,
/// broken page tree, dangling references) is absorbed and classified as
/// `Scanned`, the more expensive but always-applicable path.
pub fn classify(data: &[u8]) -> DocumentClass {
    match inspect(data) {
        Ok(class) => class,
        Err(err) => {
            log::debug!("classification fell back to scanned: {}", err);
            DocumentClass::Scanned
        }
    }
}

fn inspect(data: &[u8]) -> Result<DocumentClass, lopdf::Error> {
    let doc = Document::load_mem(data)?;
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id)?;
        if let Ok(contents) = page.get(b"Contents") {
            if has_nonempty_stream(&doc, contents) {
                return Ok(DocumentClass::Vector);
            }
        }
    }
    Ok(DocumentClass::Scanned)
}

fn has_nonempty_stream(doc: &Document, contents: &Object) -> bool {
    match contents {
        Object::Reference(id) => doc
            .get_object(*id)
            .map(|resolved| has_nonempty_stream(doc, resolved))
            .unwrap_or(false),
        Object::Stream(stream) => !stream.content.is_empty(),
        Object::Array(parts) => parts.iter().any(|part| has_nonempty_stream(doc, part)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_classify_as_scanned() {
        assert_eq!(classify(b"not a pdf at all"), DocumentClass::Scanned);
        assert_eq!(classify(&[]), DocumentClass::Scanned);
    }
}
