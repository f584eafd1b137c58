//! Page document API endpoints
//!
//! ```text
//! GET /api/v1/page-documents?page_id=1&order=alpha&visible=*
//! ```
//!
//! Query parameters are the loop arguments. The request locale is taken from
//! `lang`, then from the first `Accept-Language` tag, then from the
//! configured default.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::error::Result;
use crate::loops::{normalize_locale, LoopArgs, LoopContext, PageDocumentRow};
use crate::state::AppState;

/// Response for the page document list
#[derive(Debug, Serialize)]
pub struct PageDocumentListResponse {
    pub rows: Vec<PageDocumentRow>,
    pub total: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_page_documents))
}

async fn list_page_documents(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<PageDocumentListResponse>> {
    let args = LoopArgs::from_pairs(params)?;

    let default_locale = &state.config().server.default_locale;
    let locale = accept_language(&headers).unwrap_or_else(|| default_locale.clone());
    let ctx = LoopContext::new(locale, default_locale.as_str());

    let rows = state.page_documents().exec(&args, &ctx).await?;
    let total = rows.len();

    Ok(Json(PageDocumentListResponse { rows, total }))
}

/// First tag of the `Accept-Language` header as a locale
fn accept_language(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::ACCEPT_LANGUAGE)?.to_str().ok()?;
    let tag = value.split(',').next()?.split(';').next()?;
    normalize_locale(tag)
}
