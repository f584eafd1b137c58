//! Output row of the page document loop

use serde::Serialize;

use crate::db::PageDocument;

/// One assembled page document, serialized with the loop's variable names
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PageDocumentRow {
    pub id: i64,
    pub page_id: i64,
    pub visible: bool,
    pub position: i64,
    /// Public URL of the processed document
    pub page_document_path: Option<String>,
    /// Public URL of the first page preview, PDF only
    pub page_document_pdf_image_source: Option<String>,
    pub page_document_file: Option<String>,
    pub page_document_title: Option<String>,
    pub page_document_description: Option<String>,
    pub page_document_chapo: Option<String>,
    pub page_document_postscriptum: Option<String>,
}

impl PageDocumentRow {
    pub fn new(
        document: PageDocument,
        document_path: Option<String>,
        preview_source: Option<String>,
    ) -> Self {
        Self {
            id: document.id,
            page_id: document.page_id,
            visible: document.visible,
            position: document.position,
            page_document_path: document_path,
            page_document_pdf_image_source: preview_source,
            page_document_file: document.file,
            page_document_title: document.title,
            page_document_description: document.description,
            page_document_chapo: document.chapo,
            page_document_postscriptum: document.postscriptum,
        }
    }
}
