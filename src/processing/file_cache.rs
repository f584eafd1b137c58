//! Local file cache processor
//!
//! Copies sources into `<cache dir>/<documents|images>/<subdirectory>/` the
//! first time they are requested and answers with a URL under
//! `<base url>/cache/`. An existing cached copy is never refreshed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{
    DocumentProcessRequest, DocumentProcessor, ImageProcessRequest, ImageProcessor,
    ProcessedFile, ProcessingError, ProcessingResult,
};
use crate::storage;

const DOCUMENTS_DIR: &str = "documents";
const IMAGES_DIR: &str = "images";

#[derive(Debug, Clone)]
pub struct FileCacheProcessor {
    cache_dir: PathBuf,
    base_url: String,
}

impl FileCacheProcessor {
    pub fn new(cache_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, kind: &str, subdirectory: &str, file_name: &str) -> String {
        format!(
            "{}/cache/{}/{}/{}",
            self.base_url,
            kind,
            urlencoding::encode(subdirectory),
            urlencoding::encode(file_name)
        )
    }

    async fn publish_copy(
        &self,
        kind: &str,
        source: &Path,
        subdirectory: &str,
    ) -> ProcessingResult<ProcessedFile> {
        let file_name = source_file_name(source)?;
        let target_dir = self.cache_dir.join(kind).join(subdirectory);
        let target = target_dir.join(&file_name);

        if !storage::exists(&target).await {
            ensure_source(source).await?;
            storage::ensure_directory(&target_dir).await?;
            storage::copy_atomically(source, &target).await?;
            tracing::debug!(source = %source.display(), target = %target.display(), "Cached file");
        }

        Ok(ProcessedFile {
            url: self.url(kind, subdirectory, &file_name),
            cache_path: target,
        })
    }
}

#[async_trait]
impl DocumentProcessor for FileCacheProcessor {
    async fn process_document(
        &self,
        request: &DocumentProcessRequest,
    ) -> ProcessingResult<ProcessedFile> {
        self.publish_copy(DOCUMENTS_DIR, &request.source_path, &request.cache_subdirectory)
            .await
    }
}

#[async_trait]
impl ImageProcessor for FileCacheProcessor {
    async fn process_image(&self, request: &ImageProcessRequest) -> ProcessingResult<ProcessedFile> {
        self.publish_copy(IMAGES_DIR, &request.source_path, &request.cache_subdirectory)
            .await
    }
}

fn source_file_name(source: &Path) -> ProcessingResult<String> {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ProcessingError::InvalidFileName(source.to_path_buf()))
}

async fn ensure_source(source: &Path) -> ProcessingResult<()> {
    if tokio::fs::metadata(source)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
    {
        Ok(())
    } else {
        Err(ProcessingError::SourceNotFound(source.to_path_buf()))
    }
}
