//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL)
        .execute(pool)
        .await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Documents attached to content pages
CREATE TABLE IF NOT EXISTS page_document (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL,
    visible INTEGER NOT NULL DEFAULT 1,
    position INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_page_document_page_id ON page_document(page_id);
CREATE INDEX IF NOT EXISTS idx_page_document_position ON page_document(position);

-- Per-locale document fields; `file` is relative to the documents upload dir
CREATE TABLE IF NOT EXISTS page_document_i18n (
    id INTEGER NOT NULL REFERENCES page_document(id) ON DELETE CASCADE,
    locale TEXT NOT NULL,
    file TEXT,
    title TEXT,
    description TEXT,
    chapo TEXT,
    postscriptum TEXT,

    PRIMARY KEY (id, locale)
);

-- Media library images
CREATE TABLE IF NOT EXISTS library_image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Locale-aware title and stored file name of a library image
CREATE TABLE IF NOT EXISTS library_image_i18n (
    id INTEGER NOT NULL REFERENCES library_image(id) ON DELETE CASCADE,
    locale TEXT NOT NULL,
    title TEXT,
    file_name TEXT,

    PRIMARY KEY (id, locale)
);

-- Association between a library image and the item it illustrates
CREATE TABLE IF NOT EXISTS library_item_image (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    image_id INTEGER NOT NULL REFERENCES library_image(id) ON DELETE CASCADE,
    item_type TEXT NOT NULL,
    item_id INTEGER NOT NULL,
    locale TEXT NOT NULL,
    visible INTEGER NOT NULL DEFAULT 1,
    position INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_library_item_image_item ON library_item_image(item_type, item_id);
"#;
