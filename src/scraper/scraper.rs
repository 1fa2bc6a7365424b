// scraper.rs
use crate::scraper::models::Page;
use crate::scraper::ScraperError;
use log::{debug, info, warn};
use rand::Rng;
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Status line and raw body of a single GET.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One blocking GET. `Err` means the request never produced a response.
pub trait PageFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, ScraperError>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    fn get(&self, url: &str) -> Result<FetchResponse, ScraperError> {
        (**self).get(url)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, ScraperError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(FetchResponse { status, body })
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay grows linearly with the attempt number...
    pub base_delay: Duration,
    /// ...up to this cap, before jitter.
    pub max_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let base = std::cmp::min(self.base_delay.saturating_mul(attempt), self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

#[derive(Debug, Clone)]
pub struct FetchLimits {
    pub max_pages: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self { max_pages: 50 }
    }
}

/// Why the walk over the feed ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EmptyBody,
    NoNextLink,
    PageCap,
    RepeatedCursor(String),
}

#[derive(Debug)]
pub struct PaginatedResult {
    pub pages: Vec<Page>,
    pub stop: StopReason,
}

pub struct OlxScraper<F: PageFetcher> {
    fetcher: F,
    retry: RetryPolicy,
    limits: FetchLimits,
}

impl<F: PageFetcher> OlxScraper<F> {
    pub fn new(fetcher: F, retry: RetryPolicy, limits: FetchLimits) -> Self {
        Self {
            fetcher,
            retry,
            limits,
        }
    }

    /// Follows `links.next.href` from `start_url` until the feed runs dry.
    /// Pages come back in fetch order.
    pub fn fetch_all_pages(&self, start_url: &str) -> Result<PaginatedResult, ScraperError> {
        let mut pages = Vec::new();
        let mut seen_urls = HashSet::new();
        let mut current = start_url.to_string();

        let stop = loop {
            if pages.len() >= self.limits.max_pages {
                warn!(
                    "🛑 Page cap of {} reached, stopping before {current}",
                    self.limits.max_pages
                );
                break StopReason::PageCap;
            }

            seen_urls.insert(current.clone());
            info!("📄 Fetching page {}: {current}", pages.len() + 1);

            let page = match self.fetch_page(&current)? {
                Some(page) => page,
                None => {
                    info!("🏁 Empty response, stopping");
                    break StopReason::EmptyBody;
                }
            };

            debug!("Page {} carried {} entries", pages.len() + 1, page.data.len());

            let next = page.next_href().map(str::to_string);
            pages.push(page);

            match next {
                None => {
                    info!("🏁 No next link, stopping");
                    break StopReason::NoNextLink;
                }
                Some(next) if seen_urls.contains(&next) => {
                    warn!("🔁 Next link {next} already fetched, stopping");
                    break StopReason::RepeatedCursor(next);
                }
                Some(next) => current = next,
            }
        };

        Ok(PaginatedResult { pages, stop })
    }

    /// `Ok(None)` is the server's way of saying there is nothing left.
    pub fn fetch_page(&self, url: &str) -> Result<Option<Page>, ScraperError> {
        let body = self.fetch_body_with_retry(url)?;
        parse_page(&body)
    }

    fn fetch_body_with_retry(&self, url: &str) -> Result<String, ScraperError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=max_attempts {
            let outcome = self.fetcher.get(url).and_then(|resp| {
                if resp.is_success() {
                    Ok(resp.body)
                } else {
                    Err(ScraperError::Status {
                        status: resp.status,
                        url: url.to_string(),
                    })
                }
            });

            match outcome {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() => {
                    warn!("⚠️ Attempt {attempt}/{max_attempts} for {url} failed: {e}");
                    last_err = Some(e);

                    if attempt < max_attempts {
                        let delay = self.retry.delay_for(attempt);
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(ScraperError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            last: Box::new(
                last_err.unwrap_or_else(|| ScraperError::Network("retry loop failed".into())),
            ),
        })
    }
}

/// Parses one response body. Blank or JSON-falsy bodies map to `None`.
pub fn parse_page(body: &str) -> Result<Option<Page>, ScraperError> {
    if body.trim().is_empty() {
        return Ok(None);
    }

    let json: Value =
        serde_json::from_str(body).map_err(|e| ScraperError::JsonParse(e.to_string()))?;

    if is_falsy(&json) {
        return Ok(None);
    }

    serde_json::from_value(json)
        .map(Some)
        .map_err(|e| ScraperError::UnexpectedShape(e.to_string()))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
