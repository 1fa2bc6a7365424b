pub mod models;
mod scraper;
mod scraper_error;

pub use models::Page;
pub use scraper::{
    parse_page, FetchLimits, FetchResponse, HttpFetcher, OlxScraper, PageFetcher,
    PaginatedResult, RetryPolicy, StopReason,
};
pub use scraper_error::ScraperError;
