//! Type definitions for the compression domain.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, ValidationError};

/// Classification of an input document, decided once per document.
///
/// `Vector` means at least one page carries a non-empty content stream;
/// `Scanned` means no page does (raster-only documents, or documents whose
/// structure could not be inspected at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentClass {
    Vector,
    Scanned,
}

/// Compression strategy applied to a document, recorded next to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionStrategy {
    /// Stream-optimizing re-save of a document with drawable content.
    VectorOptimize,

    /// Per-image re-encode and downsample of a raster-only document.
    RasterReencode,
}

impl CompressionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionStrategy::VectorOptimize => "vector_optimize",
            CompressionStrategy::RasterReencode => "raster_reencode",
        }
    }
}

impl FromStr for CompressionStrategy {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vector_optimize" => Ok(CompressionStrategy::VectorOptimize),
            "raster_reencode" => Ok(CompressionStrategy::RasterReencode),
            _ => Err(DomainError::Validation(ValidationError::custom(&format!(
                "Invalid compression strategy: {}",
                s
            )))),
        }
    }
}

impl From<CompressionStrategy> for String {
    fn from(strategy: CompressionStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Color mode of one embedded raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// 1 bit per component.
    Bilevel,
    /// 8-bit single channel.
    Grayscale,
    /// Everything else.
    Color,
}

/// Target encoding for a re-embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// 1-bit deflate-compressed stream; exact round trip.
    Lossless,
    /// JPEG at the given quality.
    Jpeg(u8),
}

/// Tuning knobs for the raster strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompressionSettings {
    /// Downsample only when the effective DPI exceeds this.
    pub dpi_threshold: f32,
    /// Resolution downsampled images are brought to, and the nominal value
    /// assumed when an image declares none.
    pub target_dpi: f32,
    /// JPEG quality for grayscale and color re-encoding.
    pub jpeg_quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            dpi_threshold: 200.0,
            target_dpi: 150.0,
            jpeg_quality: 85,
        }
    }
}

/// Result of one compression run: the output bytes and the strategy that
/// produced them. Immutable once produced.
#[derive(Debug, Clone)]
pub struct CompressionOutcome {
    pub data: Vec<u8>,
    pub strategy: CompressionStrategy,
}
