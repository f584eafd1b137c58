//! Server configuration loaded from the environment

use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Prefix prepended to every processed file URL
    pub public_base_url: String,
    pub default_locale: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Filesystem roots
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Uploaded page documents, read-only to this crate
    pub documents_upload_dir: PathBuf,
    /// Rendered first-page previews
    pub images_upload_dir: PathBuf,
    /// Managed media library images
    pub library_image_dir: PathBuf,
    /// Publicly served copies of documents and images
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Render scale, 1.0 = 72 dpi
    pub scale: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                public_base_url: String::new(),
                default_locale: "en_US".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://page_documents.db".to_string(),
            },
            storage: StorageConfig {
                documents_upload_dir: PathBuf::from("local/media/documents/page"),
                images_upload_dir: PathBuf::from("local/media/images/page"),
                library_image_dir: PathBuf::from("local/media/images/library"),
                cache_dir: PathBuf::from("web/cache"),
            },
            preview: PreviewConfig { scale: 1.0 },
        }
    }
}

impl Config {
    /// Build a config from environment variables, using defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env::var("PAGE_DOCUMENTS_PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PAGE_DOCUMENTS_PORT",
                value,
            })?,
            Err(_) => defaults.server.port,
        };

        let scale = match env::var("PREVIEW_SCALE") {
            Ok(value) => match value.parse::<f32>() {
                Ok(scale) if scale > 0.0 && scale.is_finite() => scale,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "PREVIEW_SCALE",
                        value,
                    })
                }
            },
            Err(_) => defaults.preview.scale,
        };

        Ok(Self {
            server: ServerConfig {
                port,
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.server.public_base_url),
                default_locale: env::var("DEFAULT_LOCALE")
                    .unwrap_or(defaults.server.default_locale),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            storage: StorageConfig {
                documents_upload_dir: env_path("DOCUMENTS_UPLOAD_DIR")
                    .unwrap_or(defaults.storage.documents_upload_dir),
                images_upload_dir: env_path("IMAGES_UPLOAD_DIR")
                    .unwrap_or(defaults.storage.images_upload_dir),
                library_image_dir: env_path("LIBRARY_IMAGE_DIR")
                    .unwrap_or(defaults.storage.library_image_dir),
                cache_dir: env_path("CACHE_DIR").unwrap_or(defaults.storage.cache_dir),
            },
            preview: PreviewConfig { scale },
        })
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name).map(PathBuf::from)
}
