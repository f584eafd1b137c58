//! Page document database operations

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{AppError, Result};

/// Page document with its fields resolved for one locale
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PageDocument {
    pub id: i64,
    pub page_id: i64,
    pub visible: bool,
    pub position: i64,
    pub file: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub chapo: Option<String>,
    pub postscriptum: Option<String>,
}

/// Translatable document fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageDocumentI18n {
    pub file: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub chapo: Option<String>,
    pub postscriptum: Option<String>,
}

/// Create document request
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePageDocument {
    pub page_id: i64,
    pub visible: bool,
    pub position: i64,
}

/// Sort key applied to a document query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrder {
    /// Title ascending
    Alpha,
    /// Title descending
    AlphaReverse,
    /// Identity ascending
    Id,
    /// Manual position ascending
    Manual,
}

impl DocumentOrder {
    fn sql(self) -> &'static str {
        match self {
            DocumentOrder::Alpha => "title ASC",
            DocumentOrder::AlphaReverse => "title DESC",
            DocumentOrder::Id => "d.id ASC",
            DocumentOrder::Manual => "d.position ASC",
        }
    }
}

/// Filters and options for [`PageDocumentRepository::find`]
#[derive(Debug, Clone)]
pub struct DocumentQuery {
    pub ids: Option<Vec<i64>>,
    pub page_ids: Option<Vec<i64>>,
    /// `None` matches visible and hidden documents
    pub visible: Option<bool>,
    pub orders: Vec<DocumentOrder>,
    pub locale: String,
    /// Locale used for fields missing in `locale`
    pub default_locale: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl DocumentQuery {
    pub fn new(locale: impl Into<String>, default_locale: impl Into<String>) -> Self {
        Self {
            ids: None,
            page_ids: None,
            visible: Some(true),
            orders: vec![DocumentOrder::Manual],
            locale: locale.into(),
            default_locale: default_locale.into(),
            limit: None,
            offset: None,
        }
    }
}

/// Page document repository
pub struct PageDocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PageDocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Run a filtered, ordered query with locale fallback on every
    /// translatable column
    pub async fn find(&self, query: &DocumentQuery) -> Result<Vec<PageDocument>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT d.id, d.page_id, d.visible, d.position,
                   COALESCE(cur.file, def.file) AS file,
                   COALESCE(cur.title, def.title) AS title,
                   COALESCE(cur.description, def.description) AS description,
                   COALESCE(cur.chapo, def.chapo) AS chapo,
                   COALESCE(cur.postscriptum, def.postscriptum) AS postscriptum
            FROM page_document d
            LEFT JOIN page_document_i18n cur ON cur.id = d.id AND cur.locale = "#,
        );
        builder.push_bind(query.locale.clone());
        builder.push(" LEFT JOIN page_document_i18n def ON def.id = d.id AND def.locale = ");
        builder.push_bind(query.default_locale.clone());
        builder.push(" WHERE 1 = 1");

        if let Some(ids) = &query.ids {
            push_in_filter(&mut builder, "d.id", ids);
        }
        if let Some(page_ids) = &query.page_ids {
            push_in_filter(&mut builder, "d.page_id", page_ids);
        }
        if let Some(visible) = query.visible {
            builder.push(" AND d.visible = ");
            builder.push_bind(visible);
        }

        builder.push(" ORDER BY ");
        for order in &query.orders {
            builder.push(order.sql());
            builder.push(", ");
        }
        builder.push("d.id ASC");

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                builder.push(" LIMIT ");
                builder.push_bind(i64::from(limit));
                builder.push(" OFFSET ");
                builder.push_bind(i64::from(offset.unwrap_or(0)));
            }
            (None, Some(offset)) => {
                builder.push(" LIMIT -1 OFFSET ");
                builder.push_bind(i64::from(offset));
            }
            (None, None) => {}
        }

        let documents = builder
            .build_query_as::<PageDocument>()
            .fetch_all(self.pool)
            .await?;

        Ok(documents)
    }

    /// Create a document without translations
    pub async fn create(&self, data: &CreatePageDocument) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO page_document (page_id, visible, position)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(data.page_id)
        .bind(data.visible)
        .bind(data.position)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert or replace the translation of a document
    pub async fn upsert_i18n(&self, id: i64, locale: &str, data: &PageDocumentI18n) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO page_document_i18n (id, locale, file, title, description, chapo, postscriptum)
            SELECT id, ?, ?, ?, ?, ?, ? FROM page_document WHERE id = ?
            ON CONFLICT(id, locale) DO UPDATE SET
                file = excluded.file,
                title = excluded.title,
                description = excluded.description,
                chapo = excluded.chapo,
                postscriptum = excluded.postscriptum
            "#,
        )
        .bind(locale)
        .bind(&data.file)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.chapo)
        .bind(&data.postscriptum)
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Page document not found: {}", id)));
        }

        Ok(())
    }
}

fn push_in_filter(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, values: &[i64]) {
    if values.is_empty() {
        builder.push(" AND 0");
        return;
    }

    builder.push(" AND ");
    builder.push(column);
    builder.push(" IN (");
    let mut separated = builder.separated(", ");
    for value in values {
        separated.push_bind(*value);
    }
    separated.push_unseparated(")");
}
