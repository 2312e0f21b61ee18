//! Spreadsheet export of a batch of field records.
//!
//! Records are sanitized, aligned into an [`OutputTable`] and written as
//! XLSX or CSV. The destination is always overwritten.

pub mod csv;
pub mod table;
pub mod xlsx;

pub use table::{Cell, OutputTable};

use crate::error::{PdfError, Result};
use crate::forms::{FieldRecord, sanitize_record};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// `.csv` (any case) selects CSV, everything else XLSX.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Xlsx,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(PdfError::InvalidConfig(format!("unknown export format: {}", other))),
        }
    }
}

/// Export with the format inferred from the destination extension.
pub fn export(records: &[FieldRecord], destination: impl AsRef<Path>) -> Result<()> {
    let destination = destination.as_ref();
    export_as(records, destination, ExportFormat::from_path(destination))
}

/// Sanitize `records` and write them to `destination` as `format`.
pub fn export_as(records: &[FieldRecord], destination: &Path, format: ExportFormat) -> Result<()> {
    let cleaned: Vec<FieldRecord> = records.iter().cloned().map(sanitize_record).collect();
    let table = OutputTable::from_records(&cleaned);

    match format {
        ExportFormat::Xlsx => xlsx::write_xlsx(&table, destination)?,
        ExportFormat::Csv => self::csv::write_csv(&table, destination)?,
    }

    tracing::info!(
        path = %destination.display(),
        rows = table.rows.len(),
        columns = table.columns.len(),
        ?format,
        "export written"
    );
    Ok(())
}
