//! Page Documents
//!
//! Lists the documents attached to CMS pages and publishes a JPEG preview of
//! the first page of every PDF among them.
//!
//! # Modules
//!
//! - `loops`: argument parsing and row assembly
//! - `preview`: first page rasterizer and preview pipeline
//! - `media`: media library registry of generated previews
//! - `processing`: publication of documents and images into the public cache
//! - `routes`: HTTP surface

pub mod config;
pub mod db;
pub mod error;
pub mod loops;
pub mod media;
pub mod preview;
pub mod processing;
pub mod routes;
pub mod state;
pub mod storage;
