use thiserror::Error;

/// Conditions that abort a whole invocation. Non-fatal conditions travel as
/// [`crate::diagnostics::Warning`] values instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing required input: {0}")]
    MissingInput(String),

    #[error("`{table}` has {found} columns, expected {expected} ({layout})")]
    SchemaShapeMismatch {
        table: String,
        expected: usize,
        found: usize,
        layout: String,
    },

    #[error("`{table}` has no `{column}` column")]
    MissingColumn { table: String, column: String },

    #[error("cannot parse {value:?} as a number in `{table}` column `{column}`, row {row}")]
    NumericParse {
        table: String,
        column: String,
        row: usize,
        value: String,
    },

    #[error("`{column}` is not finite at report row {row}; the sum overflowed")]
    NonFiniteValue { column: String, row: usize },

    #[error("invalid date format {0:?}")]
    InvalidDateFormat(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid month label {0:?}")]
    InvalidMonthLabel(String),

    #[error("`{0}` has no header row")]
    EmptyTable(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet: {0}")]
    Spreadsheet(String),

    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl From<calamine::Error> for PipelineError {
    fn from(e: calamine::Error) -> Self {
        PipelineError::Spreadsheet(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
