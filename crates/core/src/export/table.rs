//! Rectangular view over a batch of field records.

use crate::forms::FieldRecord;
use crate::model::value::PdfValue;
use indexmap::IndexSet;
use std::fmt;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    /// Flatten a resolved value into a cell.
    ///
    /// Booleans become `TRUE`/`FALSE`, names their text, arrays their
    /// elements joined with `", "` and dictionaries `{Key: value, ...}`.
    pub fn from_value(value: &PdfValue) -> Self {
        match value {
            PdfValue::Null => Self::Empty,
            PdfValue::Int(n) => Self::Int(*n),
            PdfValue::Real(n) => Self::Real(*n),
            other => Self::Text(render(other)),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Int(n) => write!(f, "{}", n),
            Self::Real(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

fn render(value: &PdfValue) -> String {
    match value {
        PdfValue::Null => String::new(),
        PdfValue::Bool(true) => "TRUE".to_string(),
        PdfValue::Bool(false) => "FALSE".to_string(),
        PdfValue::Int(n) => n.to_string(),
        PdfValue::Real(n) => n.to_string(),
        PdfValue::Name(s) | PdfValue::Text(s) => s.clone(),
        PdfValue::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        PdfValue::Dict(dict) => {
            let entries: Vec<String> = dict
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Column-aligned table: one column per distinct field name, one row per
/// record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputTable {
    /// Field names in first-seen order. `None` is the unnamed field.
    pub columns: Vec<Option<String>>,
    pub rows: Vec<Vec<Cell>>,
}

impl OutputTable {
    pub fn from_records(records: &[FieldRecord]) -> Self {
        let columns: IndexSet<Option<String>> = records
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect();

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).map_or(Cell::Empty, Cell::from_value))
                    .collect()
            })
            .collect();

        Self {
            columns: columns.into_iter().collect(),
            rows,
        }
    }

    /// Header labels; the unnamed column gets an empty label.
    pub fn header(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.as_deref().unwrap_or(""))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }
}
