use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Cannot use database {path}: {source}")]
    StoreConnection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Row rejected by the store: {0}")]
    RowInsert(#[source] rusqlite::Error),

    #[error("Only read-only SELECT queries are allowed: {0}")]
    ReadOnly(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BankError>;
