//! Media library types

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::db::{LibraryImageI18n, LibraryItemImage};

/// Kind of item a library image is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Rasterized first page of a page document
    DocumentPreview,
}

impl AssetType {
    /// Tag stored in `library_item_image.item_type`, also used as the
    /// preview and cache subdirectory name
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::DocumentPreview => "document_preview",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered preview: the association plus the image translations
#[derive(Debug, Clone)]
pub struct PreviewAsset {
    pub association: LibraryItemImage,
    pub translations: Vec<LibraryImageI18n>,
}

impl PreviewAsset {
    pub fn image_id(&self) -> i64 {
        self.association.image_id
    }

    /// Stored file name for `locale`, falling back to the locale the
    /// association was created in and then to any translation
    pub fn file_name_for(&self, locale: &str) -> Option<&str> {
        self.translated_file_name(locale)
            .or_else(|| self.translated_file_name(&self.association.locale))
            .or_else(|| self.translations.iter().find_map(|t| t.file_name.as_deref()))
    }

    fn translated_file_name(&self, locale: &str) -> Option<&str> {
        self.translations
            .iter()
            .find(|t| t.locale == locale)
            .and_then(|t| t.file_name.as_deref())
    }

    /// Path of the stored image for `locale` inside `image_directory`
    pub fn image_path(&self, image_directory: &Path, locale: &str) -> Option<PathBuf> {
        self.file_name_for(locale)
            .map(|file_name| image_directory.join(file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(translations: Vec<(&str, Option<&str>)>) -> PreviewAsset {
        PreviewAsset {
            association: LibraryItemImage {
                id: 1,
                image_id: 10,
                item_type: AssetType::DocumentPreview.as_str().to_string(),
                item_id: 5,
                locale: "en_US".to_string(),
                visible: true,
                position: 1,
                created_at: "2026-01-01T00:00:00+00:00".to_string(),
            },
            translations: translations
                .into_iter()
                .map(|(locale, file_name)| LibraryImageI18n {
                    id: 10,
                    locale: locale.to_string(),
                    title: None,
                    file_name: file_name.map(str::to_string),
                })
                .collect(),
        }
    }

    #[test]
    fn test_file_name_for_exact_locale() {
        let asset = asset(vec![("en_US", Some("10-en.jpg")), ("fr_FR", Some("10-fr.jpg"))]);
        assert_eq!(asset.file_name_for("fr_FR"), Some("10-fr.jpg"));
    }

    #[test]
    fn test_file_name_falls_back_to_association_locale() {
        let asset = asset(vec![("de_DE", Some("10-de.jpg")), ("en_US", Some("10-en.jpg"))]);
        assert_eq!(asset.file_name_for("it_IT"), Some("10-en.jpg"));
    }

    #[test]
    fn test_file_name_falls_back_to_any_translation() {
        let asset = asset(vec![("de_DE", Some("10-de.jpg")), ("en_US", None)]);
        assert_eq!(asset.file_name_for("it_IT"), Some("10-de.jpg"));
    }

    #[test]
    fn test_image_path_missing_file_name() {
        let asset = asset(vec![("en_US", None)]);
        assert!(asset.image_path(Path::new("/library"), "en_US").is_none());

        let asset = self::asset(vec![("en_US", Some("10-a.jpg"))]);
        assert_eq!(
            asset.image_path(Path::new("/library"), "en_US"),
            Some(PathBuf::from("/library/10-a.jpg"))
        );
    }

    #[test]
    fn test_asset_type_tag() {
        assert_eq!(AssetType::DocumentPreview.to_string(), "document_preview");
    }
}
