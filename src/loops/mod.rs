//! Template loops
//!
//! A loop turns string arguments plus a request context into an ordered
//! list of rows ready for rendering.

mod args;
mod page_document;
mod row;

pub use args::{normalize_locale, ArgumentError, BooleanOrBoth, LoopArgs};
pub use page_document::PageDocumentLoop;
pub use row::PageDocumentRow;

/// Request-scoped values a loop would otherwise read from the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopContext {
    /// Locale of the current request
    pub locale: String,
    /// Locale used for fields missing in `locale`
    pub default_locale: String,
}

impl LoopContext {
    pub fn new(locale: impl Into<String>, default_locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            default_locale: default_locale.into(),
        }
    }
}
