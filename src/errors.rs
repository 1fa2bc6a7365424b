// errors.rs
use crate::domain::NormalizeError;
use crate::mailer::MailerError;
use crate::scraper::ScraperError;
use crate::spreadsheets::ExportError;
use thiserror::Error;

/// Why a single query's run stopped. Each variant names the stage that
/// failed, so a bad mail relay never reads like a bad feed.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScraperError),
    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
    #[error("notification failed: {0}")]
    Notify(#[from] MailerError),
}

impl QueryError {
    pub fn stage(&self) -> &'static str {
        match self {
            QueryError::Scrape(_) => "scrape",
            QueryError::Normalize(_) => "normalize",
            QueryError::Export(_) => "export",
            QueryError::Notify(_) => "notify",
        }
    }
}
