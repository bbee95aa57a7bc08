//! CSV export of accepted places.

use std::io::Write;
use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};
use tracing::info;

use crate::models::ResultRecord;

pub const HEADERS: [&str; 6] = [
    "Name",
    "Category",
    "Area Name",
    "Zone Index",
    "Latitude",
    "Longitude",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no results to export")]
    Empty,
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the header row followed by one fully quoted row per record
pub fn write_csv<W: Write>(records: &[ResultRecord], mut out: W) -> Result<(), ExportError> {
    writeln!(out, "{}", HEADERS.join(","))?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .has_headers(false)
        .from_writer(out);

    for record in records {
        writer.write_record([
            record.name.clone(),
            record.category.clone(),
            record.area_name.clone(),
            record.zone_index.to_string(),
            record.latitude.to_string(),
            record.longitude.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn to_csv_string(records: &[ResultRecord]) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write records to a file; refuses to write an empty table
pub fn export_to_file<P: AsRef<Path>>(records: &[ResultRecord], path: P) -> Result<(), ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let file = std::fs::File::create(path.as_ref())?;
    write_csv(records, std::io::BufWriter::new(file))?;

    info!(
        "Exported {} places to {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(())
}
