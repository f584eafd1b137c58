//! Per-document preview orchestration

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::error::{PreviewError, PreviewResult};
use super::rasterizer::Rasterizer;
use crate::media::{AssetType, PreviewRegistry};
use crate::processing::{ImageProcessRequest, ImageProcessor};

/// Only stored files with the exact extension `pdf` get a preview. The
/// extension is whatever follows the last dot of the file name, so a file
/// named `.pdf` qualifies.
pub fn is_previewable(file: &str) -> bool {
    Path::new(file)
        .file_name()
        .and_then(OsStr::to_str)
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, extension)| extension)
        == Some("pdf")
}

/// Looks up, generates and publishes document previews
#[derive(Clone)]
pub struct PreviewPipeline {
    registry: Arc<dyn PreviewRegistry>,
    rasterizer: Arc<dyn Rasterizer>,
    image_processor: Arc<dyn ImageProcessor>,
    documents_dir: PathBuf,
    preview_dir: PathBuf,
}

impl PreviewPipeline {
    /// Previews are rendered into `<images_upload_dir>/document_preview`
    pub fn new(
        registry: Arc<dyn PreviewRegistry>,
        rasterizer: Arc<dyn Rasterizer>,
        image_processor: Arc<dyn ImageProcessor>,
        documents_dir: impl Into<PathBuf>,
        images_upload_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            registry,
            rasterizer,
            image_processor,
            documents_dir: documents_dir.into(),
            preview_dir: images_upload_dir
                .as_ref()
                .join(AssetType::DocumentPreview.as_str()),
        }
    }

    /// Public URL of the preview of a document, `None` when the file is not
    /// a PDF or the preview could not be produced.
    ///
    /// Rasterization and image processing failures are logged and swallowed;
    /// directory creation and registry failures are returned.
    pub async fn preview_url(
        &self,
        document_id: i64,
        file: &str,
        locale: &str,
    ) -> PreviewResult<Option<String>> {
        if !is_previewable(file) {
            return Ok(None);
        }

        match self.publish(document_id, file, locale).await {
            Ok(url) => Ok(Some(url)),
            Err(e) if e.is_recoverable() => {
                tracing::error!(
                    document_id = document_id,
                    file = %file,
                    error = %e,
                    "Document preview unavailable"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn publish(&self, document_id: i64, file: &str, locale: &str) -> PreviewResult<String> {
        let asset = match self
            .registry
            .find_existing_preview(AssetType::DocumentPreview, document_id)
            .await?
        {
            Some(asset) => asset,
            None => {
                let source = self.documents_dir.join(file);
                let rendered = self
                    .rasterizer
                    .render_first_page(&source, &self.preview_dir, file)
                    .await?;

                self.registry
                    .record_new_preview(
                        &rendered,
                        file,
                        locale,
                        AssetType::DocumentPreview,
                        document_id,
                    )
                    .await?
            }
        };

        let image_path = asset
            .image_path(self.registry.image_directory(), locale)
            .ok_or_else(|| {
                PreviewError::ImageProcessing(format!(
                    "Library image {} has no stored file",
                    asset.image_id()
                ))
            })?;

        let request = ImageProcessRequest::new(image_path, AssetType::DocumentPreview.as_str());
        let processed = self.image_processor.process_image(&request).await?;

        Ok(processed.url)
    }
}
