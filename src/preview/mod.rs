//! Lazy PDF preview generation
//!
//! A page document whose stored file is a PDF gets a thumbnail of its first
//! page. The thumbnail is rendered once, registered in the media library and
//! published through the image processor on every later request.
//!
//! ```text
//!   registry lookup ──found──────────────────────────┐
//!        │                                            ▼
//!     missing ─► rasterize page 1 ─► register ─► resolve library path
//!                                                     │
//!                                                     ▼
//!                                            process image ─► URL
//! ```
//!
//! Nothing invalidates a preview: a replaced PDF keeps serving the thumbnail
//! of the file it replaced.

mod error;
mod pipeline;
mod rasterizer;

pub use error::{PreviewError, PreviewResult};
pub use pipeline::{is_previewable, PreviewPipeline};
pub use rasterizer::{preview_target, MupdfRasterizer, Rasterizer};

#[cfg(test)]
pub(crate) use pipeline::tests::{FailingRasterizer, FakeRasterizer};
