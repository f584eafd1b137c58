//! Media library association registry
//!
//! Remembers which library image belongs to which owning item, so a derived
//! asset such as a document preview is generated once and then looked up.
//!
//! - [`PreviewRegistry`]: lookup and first-time registration contract
//! - [`LibraryImageService`]: SQLite-backed implementation that also stores
//!   the physical file in the library image directory

mod service;
mod types;

use std::path::Path;

use async_trait::async_trait;

pub use service::LibraryImageService;
pub use types::{AssetType, PreviewAsset};

use crate::error::Result;

/// Association registry for generated previews
#[async_trait]
pub trait PreviewRegistry: Send + Sync {
    /// Existing preview of `asset_type` for an owning item. Absence is not an
    /// error and performs no disk work.
    async fn find_existing_preview(
        &self,
        asset_type: AssetType,
        owner_id: i64,
    ) -> Result<Option<PreviewAsset>>;

    /// Store `source_file` in the library and associate it with its owner.
    ///
    /// Meant to be called once per first generation; two concurrent first
    /// calls create two associations.
    async fn record_new_preview(
        &self,
        source_file: &Path,
        display_name: &str,
        locale: &str,
        asset_type: AssetType,
        owner_id: i64,
    ) -> Result<PreviewAsset>;

    /// Library image directory
    fn image_directory(&self) -> &Path;
}
