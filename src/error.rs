use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{role} file not found: expected it at {path}")]
    MissingSource { role: &'static str, path: PathBuf },

    #[error("{table} is missing required columns {missing:?}; columns present: {available:?}")]
    Schema {
        table: &'static str,
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error(
        "reconciliation matched no rows across {roster_rows} roster rows and {usage_rows} usage rows; \
         the name formats likely differ. Sample roster keys: {roster_samples:?}; sample usage keys: {usage_samples:?}"
    )]
    EmptyJoin {
        roster_rows: usize,
        usage_rows: usize,
        roster_samples: Vec<String>,
        usage_samples: Vec<String>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
