//! Document and image processing collaborators
//!
//! The loop never serves files from the upload directories directly. Each
//! file is handed to a processor together with a cache subdirectory tag and
//! the processor answers with the public URL of a cached copy.
//!
//! - [`DocumentProcessor`]: raw documents, copied as-is
//! - [`ImageProcessor`]: images
//!
//! [`FileCacheProcessor`] implements both on top of a local cache directory.

mod error;
mod file_cache;

use std::path::PathBuf;

use async_trait::async_trait;

pub use error::{ProcessingError, ProcessingResult};
pub use file_cache::FileCacheProcessor;

/// Cache subdirectory for processed page documents
pub const PAGE_DOCUMENT_SUBDIRECTORY: &str = "page_document";

/// Request to publish a raw document
#[derive(Debug, Clone)]
pub struct DocumentProcessRequest {
    pub source_path: PathBuf,
    pub cache_subdirectory: String,
}

impl DocumentProcessRequest {
    pub fn new(source_path: impl Into<PathBuf>, cache_subdirectory: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            cache_subdirectory: cache_subdirectory.into(),
        }
    }
}

/// Request to publish an image
#[derive(Debug, Clone)]
pub struct ImageProcessRequest {
    pub source_path: PathBuf,
    pub cache_subdirectory: String,
}

impl ImageProcessRequest {
    pub fn new(source_path: impl Into<PathBuf>, cache_subdirectory: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            cache_subdirectory: cache_subdirectory.into(),
        }
    }
}

/// Result of a processing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    /// Cached copy on disk
    pub cache_path: PathBuf,
    /// Public URL of the cached copy
    pub url: String,
}

/// Publishes raw documents
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    async fn process_document(
        &self,
        request: &DocumentProcessRequest,
    ) -> ProcessingResult<ProcessedFile>;
}

/// Publishes images
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process_image(&self, request: &ImageProcessRequest) -> ProcessingResult<ProcessedFile>;
}
