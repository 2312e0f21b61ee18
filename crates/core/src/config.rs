//! Pipeline configuration.

use crate::error::{PdfError, Result};
use crate::export::ExportFormat;
use crate::forms::{DEFAULT_MAX_DEPTH, ExtractOptions};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default destination spreadsheet.
pub const DEFAULT_OUTPUT_FILE: &str = "donnees_formulaire.xlsx";

/// Everything the pipeline needs to know, fixed at construction time.
///
/// Missing keys in a serialized config take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned (non-recursively) for input files.
    pub input_directory: PathBuf,

    /// Spreadsheet written at the end of the run. Overwritten if present.
    pub output_file: PathBuf,

    /// Depth budget for resolving composite field values.
    pub max_resolution_depth: usize,

    /// File-name suffix selecting inputs. Case-sensitive.
    pub file_extension_filter: String,

    /// Output format. `None` infers it from `output_file`.
    pub format: Option<ExportFormat>,

    /// Abort on the first file that cannot be read.
    pub fail_fast: bool,

    /// Collect named child fields of valueless parents.
    pub descend_kids: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_directory: PathBuf::from("."),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            max_resolution_depth: DEFAULT_MAX_DEPTH,
            file_extension_filter: ".pdf".to_string(),
            format: None,
            fail_fast: false,
            descend_kids: true,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.max_resolution_depth == 0 {
            return Err(PdfError::InvalidConfig(
                "max_resolution_depth must be at least 1".into(),
            ));
        }
        if self.file_extension_filter.is_empty() {
            return Err(PdfError::InvalidConfig(
                "file_extension_filter must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn export_format(&self) -> ExportFormat {
        self.format
            .unwrap_or_else(|| ExportFormat::from_path(&self.output_file))
    }

    pub const fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            max_depth: self.max_resolution_depth,
            descend_kids: self.descend_kids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output_file, PathBuf::from("donnees_formulaire.xlsx"));
        assert_eq!(config.max_resolution_depth, 10);
        assert_eq!(config.file_extension_filter, ".pdf");
        assert_eq!(config.export_format(), ExportFormat::Xlsx);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"input_directory": "forms", "format": "csv"}"#).unwrap();
        assert_eq!(config.input_directory, PathBuf::from("forms"));
        assert_eq!(config.export_format(), ExportFormat::Csv);
        assert!(config.descend_kids);
    }

    #[test]
    fn test_format_follows_output_extension() {
        let config = Config {
            output_file: "out.csv".into(),
            ..Config::default()
        };
        assert_eq!(config.export_format(), ExportFormat::Csv);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let config = Config {
            max_resolution_depth: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(PdfError::InvalidConfig(_))));
    }
}
