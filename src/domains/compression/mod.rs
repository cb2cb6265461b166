// Declare submodules for the compression domain
pub mod classifier;
pub mod raster;
pub mod service;
pub mod types;
pub mod vector;

// Re-export key types
pub use types::{
    ColorMode, CompressionOutcome, CompressionSettings, CompressionStrategy, DocumentClass,
    ImageEncoding,
};

pub use service::{CompressionService, PdfCompressionService};
