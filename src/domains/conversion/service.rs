//! PDF to DOCX conversion: render pages, OCR each one, assemble a document.

use std::sync::Arc;

use async_trait::async_trait;

use super::docx;
use super::ocr::OcrEngine;
use crate::domains::core::renderer::PageRenderer;
use crate::errors::ServiceResult;

/// Resolution pages are rendered at before recognition.
const OCR_RENDER_DPI: u32 = 200;

#[async_trait]
pub trait ConvertService: Send + Sync {
    /// OCR every page of the PDF and return the assembled DOCX bytes.
    async fn convert_to_docx(&self, data: Vec<u8>) -> ServiceResult<Vec<u8>>;
}

pub struct OcrConvertService {
    renderer: Arc<PageRenderer>,
    ocr: OcrEngine,
}

impl OcrConvertService {
    pub fn new(renderer: Arc<PageRenderer>, ocr: OcrEngine) -> Self {
        Self { renderer, ocr }
    }
}

#[async_trait]
impl ConvertService for OcrConvertService {
    async fn convert_to_docx(&self, data: Vec<u8>) -> ServiceResult<Vec<u8>> {
        let pages = self.renderer.render_pages(data, OCR_RENDER_DPI).await?;
        log::info!("recognizing text on {} rendered pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len());
        for page in pages {
            texts.push(self.ocr.recognize(page).await?);
        }

        Ok(docx::build_docx(&texts)?)
    }
}
