use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::error::PipelineError;
use crate::models::{RosterRow, UsageRow, UsageTable};

const ROSTER_COLUMNS: [&str; 4] = ["NOMBRE", "PAIS", "CARGO", "AREA"];
// Some usage extracts label the identity column "Custom Date".
const USAGE_NAME_COLUMNS: [&str; 2] = ["NOMBRE", "Custom Date"];
const USAGE_TOTAL_COLUMN: &str = "Total";

fn read_headers(reader: &mut csv::Reader<std::fs::File>) -> Result<Vec<String>, PipelineError> {
    Ok(reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect())
}

pub fn load_roster(path: &Path) -> Result<Vec<RosterRow>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingSource {
            role: "roster",
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = read_headers(&mut reader)?;

    let positions: Vec<Option<usize>> = ROSTER_COLUMNS
        .iter()
        .map(|column| headers.iter().position(|header| header == column))
        .collect();
    let missing: Vec<String> = ROSTER_COLUMNS
        .iter()
        .zip(&positions)
        .filter(|(_, position)| position.is_none())
        .map(|(column, _)| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema {
            table: "roster",
            missing,
            available: headers,
        });
    }

    let field = |record: &StringRecord, index: usize| -> String {
        positions[index]
            .and_then(|position| record.get(position))
            .unwrap_or("")
            .to_string()
    };

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(RosterRow {
            name: field(&record, 0),
            country: field(&record, 1),
            role: field(&record, 2),
            org_unit: field(&record, 3),
        });
    }
    info!("loaded {} roster rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn load_usage(path: &Path) -> Result<UsageTable, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingSource {
            role: "usage",
            path: path.to_path_buf(),
        });
    }

    let mut reader = csv::Reader::from_path(path)?;
    let headers = read_headers(&mut reader)?;

    let Some(name_position) = USAGE_NAME_COLUMNS
        .iter()
        .find_map(|column| headers.iter().position(|header| header == column))
    else {
        return Err(PipelineError::Schema {
            table: "usage",
            missing: vec!["NOMBRE".to_string()],
            available: headers,
        });
    };

    // Everything except the identity column and the precomputed Total
    // column is a month column.
    let mut month_positions = Vec::new();
    let mut month_columns = Vec::new();
    for (position, header) in headers.iter().enumerate() {
        if position == name_position || header == USAGE_TOTAL_COLUMN {
            continue;
        }
        month_positions.push(position);
        month_columns.push(header.clone());
    }
    if month_columns.is_empty() {
        return Err(PipelineError::Schema {
            table: "usage",
            missing: vec!["month columns".to_string()],
            available: headers,
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(UsageRow {
            name: record.get(name_position).unwrap_or("").to_string(),
            values: month_positions
                .iter()
                .map(|&position| record.get(position).unwrap_or("").to_string())
                .collect(),
        });
    }

    // The export tool repeats a metadata row directly under the header;
    // drop it before treating the remainder as data.
    if rows.len() > 1 {
        rows.remove(1);
    }

    info!(
        "loaded {} usage rows and {} month columns from {}",
        rows.len(),
        month_columns.len(),
        path.display()
    );
    Ok(UsageTable { month_columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_roster_and_ignores_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "roster.csv",
            "NOMBRE,PAIS,CARGO,AREA,EXTRA\nAna Ruiz,CO,Analyst,Sales,ignored\n",
        );

        let rows = load_roster(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ana Ruiz");
        assert_eq!(rows[0].org_unit, "Sales");
    }

    #[test]
    fn missing_roster_file_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere.csv");

        let err = load_roster(&path).unwrap_err();
        match err {
            PipelineError::MissingSource { role, path: reported } => {
                assert_eq!(role, "roster");
                assert_eq!(reported, path);
            }
            other => panic!("expected MissingSource, got {other:?}"),
        }
    }

    #[test]
    fn missing_columns_list_what_is_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "roster.csv", "NOMBRE,PAIS\nAna Ruiz,CO\n");

        let err = load_roster(&path).unwrap_err();
        match err {
            PipelineError::Schema { table, missing, available } => {
                assert_eq!(table, "roster");
                assert_eq!(missing, vec!["CARGO".to_string(), "AREA".to_string()]);
                assert_eq!(available, vec!["NOMBRE".to_string(), "PAIS".to_string()]);
            }
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn usage_drops_total_column_and_metadata_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "usage.csv",
            "NOMBRE,Sep-24,Oct-24,Total\n\
             Ana Ruiz,5,0,5\n\
             metadata,x,x,x\n\
             Beto Paz,0,2,2\n",
        );

        let table = load_usage(&path).unwrap();
        assert_eq!(table.month_columns, vec!["Sep-24", "Oct-24"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].name, "Ana Ruiz");
        assert_eq!(table.rows[1].name, "Beto Paz");
        assert_eq!(table.rows[1].values, vec!["0", "2"]);
    }

    #[test]
    fn usage_accepts_the_custom_date_identity_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "usage.csv",
            "Custom Date,Sep-24\nAna Ruiz,3\n",
        );

        let table = load_usage(&path).unwrap();
        assert_eq!(table.rows[0].name, "Ana Ruiz");
        assert_eq!(table.month_columns, vec!["Sep-24"]);
    }

    #[test]
    fn usage_without_month_columns_is_a_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "usage.csv", "NOMBRE,Total\nAna Ruiz,5\n");

        let err = load_usage(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { table: "usage", .. }));
    }
}
