//! Error types for the transform module.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while transforming one asset.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The input file could not be read.
    #[error("Failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a decodable image.
    #[error("Failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The processed image could not be encoded.
    #[error("Failed to encode {extension} output")]
    Encode {
        extension: String,
        #[source]
        source: image::ImageError,
    },

    /// No encoder for the output extension.
    #[error("Unsupported output format: {extension}")]
    UnsupportedFormat { extension: String },

    /// Writing the processed image failed.
    #[error(transparent)]
    Write(#[from] StoreError),

    /// The blocking task running the filters did not finish.
    #[error("Transform task failed: {0}")]
    Join(String),
}

impl TransformError {
    /// Creates a decode error.
    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }

    /// One-line cause including the underlying error chain.
    pub fn cause(&self) -> String {
        crate::error_chain(self)
    }
}
