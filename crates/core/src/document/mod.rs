//! PDF Document module - the document handle and the machinery behind it.
//!
//! This module contains:
//! - `catalog` - PDF document parsing, object resolution (PDFDocument)
//! - `xref` - cross-reference tables, streams and fallback scanning
//! - `filters` - stream decoding for object and xref streams

pub mod catalog;
pub mod filters;
pub mod xref;

pub use catalog::PDFDocument;
