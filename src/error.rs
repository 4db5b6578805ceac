//! Error types for loading and querying the rental tables.

use thiserror::Error;

/// Everything that can go wrong between reading a CSV file and producing
/// an aggregation. All variants are fatal for the current run: the dataset
/// is fixed, so a bad row means the input has to be fixed and reloaded.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to parse record at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Unknown {field} code {code} at line {line}")]
    Mapping {
        field: &'static str,
        code: i64,
        line: u64,
    },

    #[error(
        "Inconsistent counts at line {line}: casual {casual} + registered {registered} != total {total}"
    )]
    InconsistentTotal {
        line: u64,
        casual: u32,
        registered: u32,
        total: u32,
    },

    #[error("Record at line {line} has no hour; hourly grouping needs the hourly table")]
    HourUnavailable { line: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Wraps a csv error, keeping the line number when the reader reports one.
    pub fn from_csv(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => DataError::Io(e),
            _ => DataError::Parse { line, message },
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;
