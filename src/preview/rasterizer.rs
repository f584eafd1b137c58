//! First-page rasterizer
//!
//! Renders page 1 of a PDF to `<destination>/<base name>.jpg` with MuPDF.
//! The target file doubles as the cache entry: when it exists nothing is
//! rendered.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use image::DynamicImage;
use mupdf::{Colorspace, Document, Matrix};
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use super::error::{PreviewError, PreviewResult};
use crate::storage;

/// Renders the first page of a document to a JPEG file
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render page 1 of `source` to `destination_dir/<base_file_name>.jpg`
    /// and return that path. An existing target is returned untouched.
    async fn render_first_page(
        &self,
        source: &Path,
        destination_dir: &Path,
        base_file_name: &str,
    ) -> PreviewResult<PathBuf>;
}

/// Target path of a rendered first page
pub fn preview_target(destination_dir: &Path, base_file_name: &str) -> PathBuf {
    destination_dir.join(format!("{}.jpg", base_file_name))
}

/// MuPDF-backed rasterizer
pub struct MupdfRasterizer {
    scale: f32,
    /// One lock per target being rendered in this process
    renders: Mutex<HashMap<PathBuf, Weak<AsyncMutex<()>>>>,
}

impl Default for MupdfRasterizer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MupdfRasterizer {
    /// `scale` 1.0 renders at 72 dpi
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale.clamp(0.1, 4.0),
            renders: Mutex::new(HashMap::new()),
        }
    }

    fn render_lock(&self, target: &Path) -> Arc<AsyncMutex<()>> {
        let mut renders = self.renders.lock();
        renders.retain(|_, lock| lock.strong_count() > 0);

        if let Some(lock) = renders.get(target).and_then(Weak::upgrade) {
            return lock;
        }

        let lock = Arc::new(AsyncMutex::new(()));
        renders.insert(target.to_path_buf(), Arc::downgrade(&lock));
        lock
    }
}

#[async_trait]
impl Rasterizer for MupdfRasterizer {
    async fn render_first_page(
        &self,
        source: &Path,
        destination_dir: &Path,
        base_file_name: &str,
    ) -> PreviewResult<PathBuf> {
        storage::ensure_directory(destination_dir)
            .await
            .map_err(|e| PreviewError::DirectoryCreation {
                path: destination_dir.to_path_buf(),
                source: e,
            })?;

        let target = preview_target(destination_dir, base_file_name);
        if storage::exists(&target).await {
            tracing::debug!(target = %target.display(), "Preview already rendered");
            return Ok(target);
        }

        let lock = self.render_lock(&target);
        let _guard = lock.lock().await;

        // Another request may have rendered it while we waited
        if storage::exists(&target).await {
            return Ok(target);
        }

        let source_owned = source.to_path_buf();
        let scale = self.scale;
        let jpeg = tokio::task::spawn_blocking(move || render_first_page_jpeg(&source_owned, scale))
            .await
            .map_err(|e| PreviewError::Rasterization(format!("Task join error: {}", e)))??;

        storage::write_atomically(&target, &jpeg)
            .await
            .map_err(|e| {
                PreviewError::Rasterization(format!("Failed to write {}: {}", target.display(), e))
            })?;

        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            bytes = jpeg.len(),
            "Rendered document preview"
        );

        Ok(target)
    }
}

/// Open the document fresh, render page index 0 and encode it as JPEG
fn render_first_page_jpeg(source: &Path, scale: f32) -> PreviewResult<Vec<u8>> {
    let path = source.to_str().ok_or_else(|| {
        PreviewError::Rasterization(format!("Non UTF-8 path: {}", source.display()))
    })?;

    let document = Document::open(path)?;
    if document.page_count()? < 1 {
        return Err(PreviewError::Rasterization(format!(
            "Document has no pages: {}",
            source.display()
        )));
    }

    let page = document.load_page(0)?;
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();
    let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;

    encode_jpeg(&pixmap)
}

fn encode_jpeg(pixmap: &mupdf::Pixmap) -> PreviewResult<Vec<u8>> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    // JPEG has no alpha channel, keep RGB only
    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            let r = samples.get(offset).copied().unwrap_or(255);
            let g = samples.get(offset + 1).copied().unwrap_or(r);
            let b = samples.get(offset + 2).copied().unwrap_or(r);
            rgb_buffer.extend_from_slice(&[r, g, b]);
        }
    }

    let img = image::RgbImage::from_raw(width, height, rgb_buffer)
        .ok_or_else(|| PreviewError::Rasterization("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut output), image::ImageFormat::Jpeg)?;

    Ok(output)
}
