use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("JSON parse error: {0}")]
    JsonParse(String),
    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),
    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<ScraperError>,
    },
}

impl ScraperError {
    /// Transport failures and bad statuses are worth another attempt.
    /// Anything about the body itself is not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScraperError::Network(_) | ScraperError::Status { .. })
    }
}
