use std::io;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineError;

/// Write any derived table as comma-separated text: header row from the
/// struct fields, no index column.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Same table, streamed to stdout instead of a file.
pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn dated_file_name(stem: &str) -> String {
    format!("{stem}_{}.csv", chrono::Local::now().format("%Y%m%d"))
}
