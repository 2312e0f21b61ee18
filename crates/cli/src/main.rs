//! formharvest - collect PDF form field values from a directory into one
//! spreadsheet.
//!
//! Every `*.pdf` file in the input directory contributes one row; every
//! distinct field name becomes a column.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use formharvest_core::{BatchReport, Config, ExportFormat, Pipeline};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Spreadsheet format of the output file.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Excel workbook
    Xlsx,
    /// Comma-separated values
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Xlsx => Self::Xlsx,
            FormatArg::Csv => Self::Csv,
        }
    }
}

/// Extract AcroForm field values from every PDF in a directory into one
/// spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "formharvest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the PDF files [default: .]
    input_dir: Option<PathBuf>,

    /// Output spreadsheet [default: donnees_formulaire.xlsx]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Depth budget for resolving nested field values
    #[arg(long = "max-depth")]
    max_depth: Option<usize>,

    /// File-name suffix selecting input files (case-sensitive)
    #[arg(long)]
    extension: Option<String>,

    /// Output format; inferred from the output extension when omitted
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Stop at the first file that cannot be read
    #[arg(long = "fail-fast", action = ArgAction::SetTrue)]
    fail_fast: bool,

    /// Only read top-level fields, ignore named child fields
    #[arg(long = "no-kids", action = ArgAction::SetTrue)]
    no_kids: bool,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,
}

fn load_config(path: &Path) -> Result<Config> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open config file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Defaults, then the config file, then explicit flags.
fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &args.input_dir {
        config.input_directory = dir.clone();
    }
    if let Some(output) = &args.output {
        config.output_file = output.clone();
    }
    if let Some(depth) = args.max_depth {
        config.max_resolution_depth = depth;
    }
    if let Some(ext) = &args.extension {
        config.file_extension_filter = ext.clone();
    }
    if let Some(format) = args.format {
        config.format = Some(format.into());
    }
    if args.fail_fast {
        config.fail_fast = true;
    }
    if args.no_kids {
        config.descend_kids = false;
    }
    Ok(config)
}

/// Collect, then export; each step reports its own failure.
fn execute(pipeline: &Pipeline) -> Result<BatchReport> {
    let config = pipeline.config();
    let report = pipeline.collect().with_context(|| {
        format!(
            "Failed to collect form data from {}",
            config.input_directory.display()
        )
    })?;
    pipeline
        .export(&report)
        .with_context(|| format!("Failed to write {}", config.output_file.display()))?;
    Ok(report)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.debug { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = build_config(&args)?;
    tracing::debug!(?config, "configuration");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let report = execute(&pipeline)?;

    let failed = report.failures().count();
    println!(
        "{} file(s) read, {} failed, written to {}",
        report.len() - failed,
        failed,
        pipeline.config().output_file.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "formharvest",
            "forms",
            "-o",
            "out.csv",
            "--max-depth",
            "4",
            "--no-kids",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.input_directory, PathBuf::from("forms"));
        assert_eq!(config.output_file, PathBuf::from("out.csv"));
        assert_eq!(config.max_resolution_depth, 4);
        assert!(!config.descend_kids);
        assert_eq!(config.export_format(), ExportFormat::Csv);
    }

    #[test]
    fn test_no_flags_means_defaults() {
        let args = Args::parse_from(["formharvest"]);
        assert_eq!(build_config(&args).unwrap(), Config::default());
    }

    #[test]
    fn test_config_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"input_directory": "from-file", "file_extension_filter": ".PDF", "fail_fast": true}}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = Args::parse_from(["formharvest", "--config", &path, "--extension", ".pdf"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.input_directory, PathBuf::from("from-file"));
        assert_eq!(config.file_extension_filter, ".pdf");
        assert!(config.fail_fast);
    }

    #[test]
    fn test_missing_input_directory_is_a_collect_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let args = Args::parse_from(["formharvest", missing.to_str().unwrap()]);
        let pipeline = Pipeline::new(build_config(&args).unwrap()).unwrap();

        let err = execute(&pipeline).unwrap_err();
        assert!(err.to_string().starts_with("Failed to collect form data from"));
    }

    #[test]
    fn test_unwritable_output_is_an_export_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().to_str().unwrap();
        let out = dir.path().join("missing").join("out.xlsx");
        let args = Args::parse_from(["formharvest", input, "-o", out.to_str().unwrap()]);
        let pipeline = Pipeline::new(build_config(&args).unwrap()).unwrap();

        let err = execute(&pipeline).unwrap_err();
        assert!(err.to_string().starts_with("Failed to write"), "{err:#}");
        assert!(!out.exists());
    }

    #[test]
    fn test_explicit_format_wins() {
        let args = Args::parse_from(["formharvest", "-o", "data.xlsx", "--format", "csv"]);
        assert_eq!(build_config(&args).unwrap().export_format(), ExportFormat::Csv);
    }
}
