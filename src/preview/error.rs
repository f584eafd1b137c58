//! Preview error types

use std::path::PathBuf;

use thiserror::Error;

use crate::error::AppError;
use crate::processing::ProcessingError;

#[derive(Debug, Error)]
pub enum PreviewError {
    /// Preview directory could not be created and does not exist
    #[error("Directory \"{}\" was not created: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source unreadable or unsupported, or encoding failed
    #[error("Rasterization error: {0}")]
    Rasterization(String),

    /// The image processor could not publish the preview
    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    /// Association lookup or registration failed
    #[error("Registry error: {0}")]
    Registry(Box<AppError>),
}

impl PreviewError {
    /// Errors that only cost the current row its preview
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PreviewError::Rasterization(_) | PreviewError::ImageProcessing(_)
        )
    }
}

impl From<mupdf::Error> for PreviewError {
    fn from(err: mupdf::Error) -> Self {
        PreviewError::Rasterization(err.to_string())
    }
}

impl From<image::ImageError> for PreviewError {
    fn from(err: image::ImageError) -> Self {
        PreviewError::Rasterization(err.to_string())
    }
}

impl From<ProcessingError> for PreviewError {
    fn from(err: ProcessingError) -> Self {
        PreviewError::ImageProcessing(err.to_string())
    }
}

impl From<AppError> for PreviewError {
    fn from(err: AppError) -> Self {
        PreviewError::Registry(Box::new(err))
    }
}

pub type PreviewResult<T> = std::result::Result<T, PreviewError>;
