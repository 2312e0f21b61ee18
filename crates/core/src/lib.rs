//! formharvest - collect AcroForm field values from a directory of PDF files
//! into one spreadsheet.
//!
//! The crate carries its own small PDF reader (enough of the file structure
//! to reach the document catalog and its interactive form) and a minimal
//! XLSX/CSV writer.
//!
//! ```no_run
//! use formharvest_core::{Config, Pipeline};
//!
//! let config = Config {
//!     input_directory: "forms".into(),
//!     ..Config::default()
//! };
//! let report = Pipeline::new(config)?.run()?;
//! println!("{} files processed", report.len());
//! # Ok::<(), formharvest_core::PdfError>(())
//! ```

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod forms;
pub mod model;
pub mod parser;

#[cfg(test)]
mod test_support;

pub use batch::{BatchReport, FileOutcome, Pipeline};
pub use config::Config;
pub use document::PDFDocument;
pub use error::{PdfError, Result};
pub use export::{ExportFormat, OutputTable, export};
pub use forms::{
    ExtractOptions, FieldRecord, FormExtractor, StructureResolver, clean_string, extract_fields,
    sanitize_record,
};
pub use model::{PDFObject, PdfValue};
