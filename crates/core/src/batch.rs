//! Directory batch processing.
//!
//! [`collect`] runs the extractor over every matching file of a directory;
//! [`Pipeline`] adds configuration handling and the final export.

use crate::config::Config;
use crate::error::{PdfError, Result};
use crate::export::export_as;
use crate::forms::{ExtractOptions, FieldRecord, extract_file};
use std::fs;
use std::path::{Path, PathBuf};

/// Result of processing one input file.
#[derive(Debug)]
pub enum FileOutcome {
    Extracted { path: PathBuf, record: FieldRecord },
    Failed { path: PathBuf, error: PdfError },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Extracted { path, .. } | Self::Failed { path, .. } => path,
        }
    }

    pub const fn record(&self) -> Option<&FieldRecord> {
        match self {
            Self::Extracted { record, .. } => Some(record),
            Self::Failed { .. } => None,
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Per-file outcomes of a batch, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// Records of the files that were read successfully, in order.
    pub fn records(&self) -> Vec<FieldRecord> {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::record)
            .cloned()
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Regular files directly inside `dir` whose name ends with `extension`,
/// sorted by file name.
pub fn list_inputs(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let read_dir_err = |source| PdfError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut inputs = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let path = entry.path();
        // Names need not be valid UTF-8; compare the raw bytes.
        let matches = entry
            .file_name()
            .as_encoded_bytes()
            .ends_with(extension.as_bytes());
        if matches && path.is_file() {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

/// Extract every matching file in `dir`. Unreadable files become
/// [`FileOutcome::Failed`] entries; with `fail_fast` the first one aborts the
/// batch instead.
pub fn collect(
    dir: &Path,
    extension: &str,
    options: ExtractOptions,
    fail_fast: bool,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    for path in list_inputs(dir, extension)? {
        match extract_file(&path, options) {
            Ok(record) => {
                tracing::info!(path = %path.display(), fields = record.len(), "extracted");
                report.outcomes.push(FileOutcome::Extracted { path, record });
            }
            Err(error) if fail_fast => {
                return Err(PdfError::InFile {
                    path,
                    source: Box::new(error),
                });
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "skipping unreadable file");
                report.outcomes.push(FileOutcome::Failed { path, error });
            }
        }
    }

    Ok(report)
}

/// A configured extraction run: collect from the input directory, then
/// export to the output file.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Extraction only; nothing is written.
    pub fn collect(&self) -> Result<BatchReport> {
        collect(
            &self.config.input_directory,
            &self.config.file_extension_filter,
            self.config.extract_options(),
            self.config.fail_fast,
        )
    }

    /// Write the records of `report` to the output file.
    pub fn export(&self, report: &BatchReport) -> Result<()> {
        export_as(
            &report.records(),
            &self.config.output_file,
            self.config.export_format(),
        )?;

        let failed = report.failures().count();
        if failed > 0 {
            tracing::warn!(failed, total = report.len(), "some files could not be read");
        }
        Ok(())
    }

    /// Collect and export. Returns the report so callers can inspect
    /// per-file failures.
    pub fn run(&self) -> Result<BatchReport> {
        let report = self.collect()?;
        self.export(&report)?;
        Ok(report)
    }
}
