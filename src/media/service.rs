//! SQLite-backed media library service

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{AssetType, PreviewAsset, PreviewRegistry};
use crate::db::LibraryImageRepository;
use crate::error::{AppError, Result};
use crate::storage;

/// Stores library images on disk and their associations in SQLite
#[derive(Clone)]
pub struct LibraryImageService {
    pool: SqlitePool,
    image_directory: PathBuf,
}

impl LibraryImageService {
    pub fn new(pool: SqlitePool, image_directory: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            image_directory: image_directory.into(),
        }
    }

    /// Copy `source_file` into the library and associate it with an item.
    ///
    /// The stored file is named `<image id>-<source file name>`. If any step
    /// after creating the image row fails, the row, its association and the
    /// stored file are removed again.
    pub async fn create_and_associate_image(
        &self,
        source_file: &Path,
        display_name: &str,
        locale: &str,
        item_type: &str,
        item_id: i64,
    ) -> Result<PreviewAsset> {
        let source_name = source_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                AppError::Internal(format!("Invalid library source: {}", source_file.display()))
            })?;

        let repo = LibraryImageRepository::new(&self.pool);
        let image_id = repo.create_image(display_name, locale).await?;

        let file_name = format!("{}-{}", image_id, source_name);
        let target = self.image_directory.join(&file_name);

        let stored: std::io::Result<()> = async {
            storage::ensure_directory(&self.image_directory).await?;
            storage::copy_atomically(source_file, &target).await
        }
        .await;

        if let Err(e) = stored {
            tracing::warn!(
                image_id = image_id,
                source = %source_file.display(),
                error = %e,
                "Failed to store library image, removing it"
            );
            repo.delete_image(image_id).await?;
            return Err(e.into());
        }

        let registered = async {
            repo.set_file_name(image_id, locale, &file_name).await?;
            let association = repo
                .create_item_image(image_id, item_type, item_id, locale)
                .await?;
            let translations = repo.list_translations(image_id).await?;
            Ok::<_, AppError>((association, translations))
        }
        .await;

        let (association, translations) = match registered {
            Ok(registered) => registered,
            Err(e) => {
                tracing::warn!(
                    image_id = image_id,
                    error = %e,
                    "Failed to register library image, removing it"
                );
                repo.delete_image(image_id).await?;
                if let Err(remove_error) = tokio::fs::remove_file(&target).await {
                    tracing::warn!(
                        path = %target.display(),
                        error = %remove_error,
                        "Failed to remove stored library image"
                    );
                }
                return Err(e);
            }
        };

        tracing::info!(
            image_id = image_id,
            item_type = item_type,
            item_id = item_id,
            locale = locale,
            file_name = %file_name,
            "Associated library image"
        );

        Ok(PreviewAsset {
            association,
            translations,
        })
    }
}

#[async_trait]
impl PreviewRegistry for LibraryImageService {
    async fn find_existing_preview(
        &self,
        asset_type: AssetType,
        owner_id: i64,
    ) -> Result<Option<PreviewAsset>> {
        let repo = LibraryImageRepository::new(&self.pool);

        let Some(association) = repo.find_item_image(asset_type.as_str(), owner_id).await? else {
            return Ok(None);
        };
        let translations = repo.list_translations(association.image_id).await?;

        Ok(Some(PreviewAsset {
            association,
            translations,
        }))
    }

    async fn record_new_preview(
        &self,
        source_file: &Path,
        display_name: &str,
        locale: &str,
        asset_type: AssetType,
        owner_id: i64,
    ) -> Result<PreviewAsset> {
        self.create_and_associate_image(
            source_file,
            display_name,
            locale,
            asset_type.as_str(),
            owner_id,
        )
        .await
    }

    fn image_directory(&self) -> &Path {
        &self.image_directory
    }
}
