//! Compression dispatch: classify once, then run the matching strategy.

use async_trait::async_trait;
use tokio::task;

use super::classifier;
use super::raster;
use super::types::{CompressionOutcome, CompressionSettings, CompressionStrategy, DocumentClass};
use super::vector;
use crate::errors::{DomainError, DomainResult};

#[async_trait]
pub trait CompressionService: Send + Sync {
    /// Compress a PDF byte stream, returning the output and the strategy
    /// that produced it. Either a complete outcome or an error; never a
    /// partially rewritten document.
    async fn compress(&self, data: Vec<u8>) -> DomainResult<CompressionOutcome>;
}

pub struct PdfCompressionService {
    settings: CompressionSettings,
}

impl PdfCompressionService {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl CompressionService for PdfCompressionService {
    async fn compress(&self, data: Vec<u8>) -> DomainResult<CompressionOutcome> {
        let settings = self.settings;

        // PDF and image work is CPU-bound; keep it off the async runtime.
        task::spawn_blocking(move || -> DomainResult<CompressionOutcome> {
            let outcome = match classifier::classify(&data) {
                DocumentClass::Vector => CompressionOutcome {
                    data: vector::optimize(&data)?,
                    strategy: CompressionStrategy::VectorOptimize,
                },
                DocumentClass::Scanned => CompressionOutcome {
                    data: raster::reencode(&data, &settings)?,
                    strategy: CompressionStrategy::RasterReencode,
                },
            };
            log::info!(
                "compressed document: {} -> {} bytes via {}",
                data.len(),
                outcome.data.len(),
                outcome.strategy.as_str()
            );
            Ok(outcome)
        })
        .await
        .map_err(|e| DomainError::Internal(format!("Task join error: {}", e)))?
    }
}
