use crate::config::{Config, Query};
use crate::domain::normalize_pages;
use crate::errors::QueryError;
use crate::mailer::{Notifier, Report};
use crate::scraper::{OlxScraper, PageFetcher, StopReason};
use crate::spreadsheets::{write_export, ListingTable};
use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug)]
pub struct QuerySummary {
    pub listings: usize,
    pub pages: usize,
    pub stop: StopReason,
    pub export_path: PathBuf,
}

#[derive(Debug)]
pub struct QueryOutcome {
    pub name: String,
    pub result: Result<QuerySummary, QueryError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialFailure,
    Failure,
}

#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listings: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportBody {
    pub message: String,
    pub status: RunStatus,
    pub queries: Vec<QueryReport>,
}

/// What the invoker gets back: `{statusCode, body: {message, status, queries}}`.
#[derive(Debug, Serialize)]
pub struct InvocationReport {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: ReportBody,
}

impl InvocationReport {
    pub fn from_outcomes(outcomes: &[QueryOutcome]) -> Self {
        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        let total = outcomes.len();

        let status = match failed {
            0 => RunStatus::Success,
            n if n == total => RunStatus::Failure,
            _ => RunStatus::PartialFailure,
        };

        let message = match status {
            RunStatus::Success => format!("{total} queries scraped and sent"),
            _ => format!("{failed} of {total} queries failed"),
        };

        let queries = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(summary) => QueryReport {
                    name: o.name.clone(),
                    ok: true,
                    listings: Some(summary.listings),
                    pages: Some(summary.pages),
                    stage: None,
                    error: None,
                },
                Err(e) => QueryReport {
                    name: o.name.clone(),
                    ok: false,
                    listings: None,
                    pages: None,
                    stage: Some(e.stage()),
                    error: Some(e.to_string()),
                },
            })
            .collect();

        InvocationReport {
            status_code: if status == RunStatus::Success { 200 } else { 500 },
            body: ReportBody {
                message,
                status,
                queries,
            },
        }
    }

    /// The run never got as far as its queries.
    pub fn startup_failure(message: impl Into<String>) -> Self {
        InvocationReport {
            status_code: 500,
            body: ReportBody {
                message: message.into(),
                status: RunStatus::Failure,
                queries: Vec::new(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.status == RunStatus::Success
    }
}

/// Runs every configured query to completion, one after another. A failing
/// query is logged and reported; the rest still run.
pub fn run_invocation<F, N>(
    cfg: &Config,
    scraper: &OlxScraper<F>,
    notifier: &N,
) -> InvocationReport
where
    F: PageFetcher,
    N: Notifier,
{
    let outcomes: Vec<QueryOutcome> = cfg
        .queries
        .iter()
        .map(|query| {
            let result = run_query(cfg, query, scraper, notifier);
            match &result {
                Ok(summary) => info!(
                    "✅ {}: {} listings from {} pages ({:?})",
                    query.name, summary.listings, summary.pages, summary.stop
                ),
                Err(e) => error!("❌ {} failed at {}: {e}", query.name, e.stage()),
            }
            QueryOutcome {
                name: query.name.clone(),
                result,
            }
        })
        .collect();

    InvocationReport::from_outcomes(&outcomes)
}

/// fetch → normalize → table → export → notify for a single query.
pub fn run_query<F, N>(
    cfg: &Config,
    query: &Query,
    scraper: &OlxScraper<F>,
    notifier: &N,
) -> Result<QuerySummary, QueryError>
where
    F: PageFetcher,
    N: Notifier,
{
    info!("🔎 Running query \"{}\"", query.name);

    let fetched = scraper.fetch_all_pages(&query.start_url)?;
    let pages = fetched.pages.len();

    let table = ListingTable::from_listings(normalize_pages(fetched.pages), cfg.timestamp)?;
    let listings = table.len();
    if table.is_empty() {
        info!("No listings for \"{}\", sending headers only", query.name);
    }

    let export_path = write_export(&table, &cfg.export_dir, &query.name, Utc::now())?;
    info!("💾 Wrote {} rows to {}", listings, export_path.display());

    notifier.send_report(&Report {
        subject: &query.name,
        listings,
        pages,
        attachment: &export_path,
    })?;

    if !cfg.keep_exports {
        if let Err(e) = std::fs::remove_file(&export_path) {
            warn!("Could not remove {}: {e}", export_path.display());
        }
    }

    Ok(QuerySummary {
        listings,
        pages,
        stop: fetched.stop,
        export_path,
    })
}
