use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Completion error: {0}")]
    CompletionError(#[from] CompletionError),
    #[error("Workbook error: {0}")]
    WorkbookError(#[from] calamine::Error),
    #[error("Workbook export error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),
    #[error("PDF error: {0}")]
    PdfError(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

/// Failures of the text-completion API.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("completion returned no text")]
    EmptyContent,
    #[error("completion is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PortalError>;
