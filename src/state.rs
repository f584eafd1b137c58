//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::loops::PageDocumentLoop;
use crate::media::LibraryImageService;
use crate::preview::{MupdfRasterizer, PreviewPipeline};
use crate::processing::FileCacheProcessor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    page_documents: PageDocumentLoop,
}

impl AppState {
    pub fn new(config: Config, page_documents: PageDocumentLoop) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                page_documents,
            }),
        }
    }

    /// Wire the production collaborators from the configuration
    pub fn from_config(config: Config, db: SqlitePool) -> Self {
        let storage = &config.storage;

        let registry = Arc::new(LibraryImageService::new(
            db.clone(),
            &storage.library_image_dir,
        ));
        let processor = Arc::new(FileCacheProcessor::new(
            &storage.cache_dir,
            &config.server.public_base_url,
        ));
        let rasterizer = Arc::new(MupdfRasterizer::new(config.preview.scale));

        let pipeline = PreviewPipeline::new(
            registry,
            rasterizer,
            processor.clone(),
            &storage.documents_upload_dir,
            &storage.images_upload_dir,
        );
        let page_documents = PageDocumentLoop::new(
            db,
            processor,
            pipeline,
            &storage.documents_upload_dir,
        );

        Self::new(config, page_documents)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the page document loop
    pub fn page_documents(&self) -> &PageDocumentLoop {
        &self.inner.page_documents
    }
}
