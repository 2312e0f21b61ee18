//! CSV output.

use super::table::OutputTable;
use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Write `table` as CSV at `path`, replacing any existing file.
pub fn write_csv(table: &OutputTable, path: &Path) -> Result<()> {
    write_records(table, File::create(path)?)
}

/// Write a header row followed by one row per record. A table without
/// columns produces an empty file.
pub fn write_records<W: Write>(table: &OutputTable, sink: W) -> Result<()> {
    let mut writer = ::csv::WriterBuilder::new().from_writer(sink);
    if table.columns.is_empty() {
        writer.flush()?;
        return Ok(());
    }
    writer.write_record(table.header())?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
