//! Content analysis for uploaded files
//!
//! This module provides:
//! - Extension-based content type overrides for web assets
//! - Content type sniffing from magic bytes (MIME type detection)

pub mod filetype;

pub use filetype::{resolve_content_type, sniff_content_type};
