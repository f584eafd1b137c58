//! Media library database operations

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

/// Association between a library image and an owning item
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LibraryItemImage {
    pub id: i64,
    pub image_id: i64,
    pub item_type: String,
    pub item_id: i64,
    pub locale: String,
    pub visible: bool,
    pub position: i64,
    pub created_at: String,
}

/// Locale-specific title and stored file name of a library image
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LibraryImageI18n {
    pub id: i64,
    pub locale: String,
    pub title: Option<String>,
    pub file_name: Option<String>,
}

/// Media library repository
pub struct LibraryImageRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LibraryImageRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// First association of `item_type` for an item, oldest wins
    pub async fn find_item_image(
        &self,
        item_type: &str,
        item_id: i64,
    ) -> Result<Option<LibraryItemImage>> {
        let item_image = sqlx::query_as::<_, LibraryItemImage>(
            r#"
            SELECT id, image_id, item_type, item_id, locale, visible, position, created_at
            FROM library_item_image
            WHERE item_type = ? AND item_id = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(item_type)
        .bind(item_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(item_image)
    }

    /// All translations of an image
    pub async fn list_translations(&self, image_id: i64) -> Result<Vec<LibraryImageI18n>> {
        let translations = sqlx::query_as::<_, LibraryImageI18n>(
            r#"
            SELECT id, locale, title, file_name
            FROM library_image_i18n
            WHERE id = ?
            ORDER BY locale ASC
            "#,
        )
        .bind(image_id)
        .fetch_all(self.pool)
        .await?;

        Ok(translations)
    }

    /// Create an image with its title in `locale`; the file name is set
    /// once the file has been stored
    pub async fn create_image(&self, title: &str, locale: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO library_image DEFAULT VALUES")
            .execute(self.pool)
            .await?;
        let image_id = result.last_insert_rowid();

        sqlx::query(
            r#"
            INSERT INTO library_image_i18n (id, locale, title)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(image_id)
        .bind(locale)
        .bind(title)
        .execute(self.pool)
        .await?;

        Ok(image_id)
    }

    pub async fn set_file_name(&self, image_id: i64, locale: &str, file_name: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE library_image_i18n
            SET file_name = ?
            WHERE id = ? AND locale = ?
            "#,
        )
        .bind(file_name)
        .bind(image_id)
        .bind(locale)
        .execute(self.pool)
        .await?;

        sqlx::query("UPDATE library_image SET updated_at = datetime('now') WHERE id = ?")
            .bind(image_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Remove an image with its translations and associations
    pub async fn delete_image(&self, image_id: i64) -> Result<bool> {
        sqlx::query("DELETE FROM library_item_image WHERE image_id = ?")
            .bind(image_id)
            .execute(self.pool)
            .await?;

        sqlx::query("DELETE FROM library_image_i18n WHERE id = ?")
            .bind(image_id)
            .execute(self.pool)
            .await?;

        let result = sqlx::query("DELETE FROM library_image WHERE id = ?")
            .bind(image_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Associate an image with an item
    pub async fn create_item_image(
        &self,
        image_id: i64,
        item_type: &str,
        item_id: i64,
        locale: &str,
    ) -> Result<LibraryItemImage> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO library_item_image (image_id, item_type, item_id, locale, position, created_at)
            VALUES (?, ?, ?, ?,
                    (SELECT COALESCE(MAX(position), 0) + 1 FROM library_item_image
                     WHERE item_type = ? AND item_id = ?),
                    ?)
            "#,
        )
        .bind(image_id)
        .bind(item_type)
        .bind(item_id)
        .bind(locale)
        .bind(item_type)
        .bind(item_id)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let item_image = sqlx::query_as::<_, LibraryItemImage>(
            r#"
            SELECT id, image_id, item_type, item_id, locale, visible, position, created_at
            FROM library_item_image
            WHERE id = ?
            "#,
        )
        .bind(result.last_insert_rowid())
        .fetch_one(self.pool)
        .await?;

        Ok(item_image)
    }

    /// Count associations of `item_type` for an item
    pub async fn count_item_images(&self, item_type: &str, item_id: i64) -> Result<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM library_item_image
            WHERE item_type = ? AND item_id = ?
            "#,
        )
        .bind(item_type)
        .bind(item_id)
        .fetch_one(self.pool)
        .await?;

        Ok(result.0)
    }
}
