//! Transform worker: decode, filter, encode, persist.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::chain::FilterChain;
use super::error::TransformError;
use crate::dispatcher::{ItemFailure, ItemSuccess, ItemWorker, Stage};
use crate::item::ItemId;
use crate::metrics;
use crate::store::AssetStore;

/// Output encoding, picked from the asset extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// Resolves the encoder for `extension`.
    pub fn for_extension(extension: &str, quality: u8) -> Result<Self, TransformError> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg {
                quality: quality.clamp(1, 100),
            }),
            _ => Err(TransformError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn encode(&self, image: &RgbImage, extension: &str) -> Result<Vec<u8>, TransformError> {
        let mut buf = Vec::new();
        let (width, height) = image.dimensions();
        let result = match *self {
            Self::Png => PngEncoder::new(&mut buf).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
            Self::Jpeg { quality } => JpegEncoder::new_with_quality(&mut buf, quality).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
        };
        result.map_err(|source| TransformError::Encode {
            extension: extension.to_string(),
            source,
        })?;
        Ok(buf)
    }
}

/// Applies a [`FilterChain`] to assets of one store and writes them to another.
pub struct TransformWorker {
    input: AssetStore,
    output: AssetStore,
    chain: Arc<FilterChain>,
    format: OutputFormat,
}

impl TransformWorker {
    /// Creates a worker. Fails if the output extension has no encoder.
    pub fn new(
        input: AssetStore,
        output: AssetStore,
        chain: FilterChain,
        quality: u8,
    ) -> Result<Self, TransformError> {
        let format = OutputFormat::for_extension(output.naming().extension(), quality)?;
        Ok(Self {
            input,
            output,
            chain: Arc::new(chain),
            format,
        })
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    async fn transform(&self, item: ItemId) -> Result<(PathBuf, u64), TransformError> {
        let input_path = self.input.path_for(item);
        let bytes = tokio::fs::read(&input_path)
            .await
            .map_err(|source| TransformError::Read {
                path: input_path.clone(),
                source,
            })?;

        let chain = Arc::clone(&self.chain);
        let format = self.format;
        let extension = self.output.naming().extension().to_string();
        let started = Instant::now();

        let encoded = tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes)
                .map_err(|e| TransformError::decode(input_path, e))?
                .to_rgb8();
            let processed = chain.apply(image);
            format.encode(&processed, &extension)
        })
        .await
        .map_err(|e| TransformError::Join(e.to_string()))??;

        let stored = self.output.persist(item, &encoded).await?;
        metrics::BYTES_TRANSFORMED.inc_by(stored.size_bytes);

        debug!(
            %item,
            size_bytes = stored.size_bytes,
            cpu_ms = started.elapsed().as_millis() as u64,
            "Transformed into {:?}",
            stored.path
        );
        Ok((stored.path, stored.size_bytes))
    }
}

#[async_trait]
impl ItemWorker for TransformWorker {
    fn stage(&self) -> Stage {
        Stage::Transform
    }

    async fn execute(&self, item: ItemId) -> Result<ItemSuccess, ItemFailure> {
        self.transform(item)
            .await
            .map(|(path, size_bytes)| ItemSuccess { path, size_bytes })
            .map_err(|e| ItemFailure::permanent(e.cause()))
    }
}
