// Declare submodules for the OCR conversion domain
pub mod docx;
pub mod ocr;
pub mod service;

pub use ocr::OcrEngine;
pub use service::{ConvertService, OcrConvertService};
