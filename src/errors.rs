use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// The HTML document is empty or not HTML at all
    #[error("Document is empty or invalid")]
    InvalidDocument,
    /// An element expected on the page is missing
    #[error("Element with ID '{0}' not found")]
    ElementNotFound(String),
    /// The element exists but lacks the requested attribute
    #[error("Element with ID '{id}' has no attribute '{attribute}'")]
    AttributeNotFound { id: String, attribute: String },
    /// A required field could not be located in an otherwise valid document
    #[error("{0}")]
    FieldNotFound(String),
    /// A value was found but could not be converted (size, date, amount, enum)
    #[error("{0}")]
    ValueFormat(String),
    /// The tender code does not follow the public market grammar
    #[error("Invalid tender code: {0}")]
    InvalidTenderCode(String),
    /// Procuring entity rules were violated (none, several, or no address)
    #[error("{0}")]
    ProcuringEntity(String),
    /// No signed base among the attachments of a tender
    #[error("No signed base found in attachments.")]
    SignedBaseNotFound,
    /// The requested date falls on a weekend
    #[error("Date {0} is a weekend. Pass allow_weekends = true to search on weekends.")]
    NonBusinessDay(NaiveDate),
    /// No adapter is registered for the country
    #[error("Country {0} is not supported.")]
    UnsupportedCountry(String),
    /// The country adapter does not implement the operation
    #[error("Operation '{operation}' is not supported for {country}")]
    UnsupportedOperation {
        country: String,
        operation: &'static str,
    },
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(String),
    /// The server answered with a non-success status
    #[error("HTTP {status}: {url}")]
    HttpStatus { status: u16, url: String },
    /// The OCDS endpoint answered without the `records` key
    #[error("Incomplete OCDS record for {0}: 'records' is missing")]
    IncompleteRecord(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Regex compilation failed
    #[error("Regex error: {0}")]
    RegexError(String),
    /// Failed to parse JSON, CSV or ZIP content
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
    /// A spawned task panicked or was cancelled
    #[error("Task error: {0}")]
    TaskError(String),
}

impl AppError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Connection failures, 5xx answers and incomplete OCDS payloads are transient;
    /// everything else is reported immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::IncompleteRecord(_) => true,
            AppError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => AppError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => AppError::NetworkError(err.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::RegexError(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::ValueFormat(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::ValueFormat(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ParseError(format!("JSON: {err}"))
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::ParseError(format!("CSV: {err}"))
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::ParseError(format!("ZIP: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::TaskError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
