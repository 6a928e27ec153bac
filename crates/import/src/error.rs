use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Row {row}: missing value for '{column}'")]
    MissingValue { row: usize, column: String },
    #[error("Row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },
    #[error("Row {row}: invalid amount '{value}'")]
    InvalidAmount { row: usize, value: String },
    #[error("Row {row}: invalid id '{value}' in '{column}'")]
    InvalidId {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Row {row}: invalid value '{value}' in '{column}'")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
    #[error("Row {row}: invalid match string '{value}'")]
    InvalidMatchString { row: usize, value: String },
}
