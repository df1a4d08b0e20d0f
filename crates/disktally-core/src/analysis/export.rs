/// Export a usage report as JSON or as a flat CSV listing.
use super::snapshot::{TreeSnapshot, UsageReport};
use crate::error::Result;
use serde::Serialize;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `report` as pretty-printed JSON.
pub fn write_json<W: Write>(report: &UsageReport, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

pub fn export_json(report: &UsageReport, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_json(report, &mut writer)?;
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct CsvRow<'a> {
    path: Cow<'a, str>,
    total_size: u64,
    direct_file_size: u64,
    state: String,
    scan_failed: bool,
}

/// One row per captured directory, pre-order, with a header row.
pub fn write_csv<W: Write>(snapshot: &TreeSnapshot, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for dir in snapshot.iter() {
        csv.serialize(CsvRow {
            path: dir.path.to_string_lossy(),
            total_size: dir.total_size,
            direct_file_size: dir.direct_file_size,
            state: dir.state.to_string(),
            scan_failed: dir.scan_failed,
        })?;
    }
    csv.flush()?;
    Ok(())
}

pub fn export_csv(snapshot: &TreeSnapshot, path: &Path) -> Result<()> {
    write_csv(snapshot, File::create(path)?)
}
