//! Interactive form (AcroForm) handling.
//!
//! - `resolver` - bounded, cycle-safe resolution of object graphs
//! - `extract` - field name/value collection
//! - `sanitize` - cleanup of extracted text

pub mod extract;
pub mod resolver;
pub mod sanitize;

pub use extract::{ExtractOptions, FieldRecord, FormExtractor, extract_fields, extract_file};
pub use resolver::{DEFAULT_MAX_DEPTH, StructureResolver, resolve_value};
pub use sanitize::{clean_string, sanitize_record};
