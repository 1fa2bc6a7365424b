use crate::config::Config;
use crate::mailer::BrevoMailer;
use crate::pipeline::{run_invocation, InvocationReport};
use crate::scraper::{HttpFetcher, OlxScraper};
use log::{error, info};

mod config;
mod domain;
mod errors;
mod mailer;
mod pipeline;
mod scraper;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1️⃣ Load configuration once
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => abort_startup(format!("Configuration error: {e}")),
    };

    // 2️⃣ Build the collaborators
    let fetcher = match HttpFetcher::new(cfg.fetch_timeout) {
        Ok(f) => f,
        Err(e) => abort_startup(format!("HTTP client init failed: {e}")),
    };
    let mailer = match BrevoMailer::new(cfg.mail.clone(), cfg.fetch_timeout) {
        Ok(m) => m,
        Err(e) => abort_startup(format!("Mailer init failed: {e}")),
    };
    let scraper = OlxScraper::new(fetcher, cfg.retry.clone(), cfg.limits.clone());

    // 3️⃣ Run every query
    info!("Starting run for {} queries", cfg.queries.len());
    let report = run_invocation(&cfg, &scraper, &mailer);

    print_report(&report);

    if !report.is_success() {
        std::process::exit(1);
    }
}

fn print_report(report: &InvocationReport) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Could not serialize report: {e}"),
    }
}

fn abort_startup(message: String) -> ! {
    error!("❌ {message}");
    print_report(&InvocationReport::startup_failure(message));
    std::process::exit(1);
}
