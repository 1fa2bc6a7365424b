use crate::mailer::{MailerConfig, BREVO_API_URL};
use crate::scraper::{FetchLimits, RetryPolicy};
use crate::spreadsheets::TimestampColumn;
use dotenvy::dotenv;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const QUERIES_ENV: &str = "OLX_QUERIES";
const MAX_BACKOFF_SECS: u64 = 600;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

/// A named search whose results get mailed under that name.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub name: String,
    pub start_url: String,
}

/// Everything one invocation needs. Built once, then only borrowed.
#[derive(Debug, Clone)]
pub struct Config {
    pub queries: Vec<Query>,
    pub mail: MailerConfig,
    pub fetch_timeout: Duration,
    pub retry: RetryPolicy,
    pub limits: FetchLimits,
    pub export_dir: PathBuf,
    pub timestamp: TimestampColumn,
    pub keep_exports: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let queries = parse_queries(&required(QUERIES_ENV)?)?;

        let mail = MailerConfig {
            api_url: lookup("MAIL_API_URL").unwrap_or_else(|| BREVO_API_URL.to_string()),
            api_key: required("BREVO_API_KEY")?,
            sender_email: required("MAIL_SENDER_EMAIL")?,
            sender_name: lookup("MAIL_SENDER_NAME").unwrap_or_else(|| "OLX Notifier".to_string()),
            recipient_email: required("MAIL_RECIPIENT_EMAIL")?,
        };

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: parse_or(&lookup, "FETCH_MAX_ATTEMPTS", defaults.max_attempts)?,
            base_delay: Duration::from_secs(parse_or(
                &lookup,
                "FETCH_BACKOFF_SECS",
                defaults.base_delay.as_secs(),
            )?),
            ..defaults
        };
        if retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "FETCH_MAX_ATTEMPTS",
                message: "must be at least 1".into(),
            });
        }
        if retry.base_delay > Duration::from_secs(MAX_BACKOFF_SECS) {
            return Err(ConfigError::Invalid {
                key: "FETCH_BACKOFF_SECS",
                message: format!("must be at most {MAX_BACKOFF_SECS}"),
            });
        }

        let limits = FetchLimits {
            max_pages: parse_or(&lookup, "FETCH_MAX_PAGES", FetchLimits::default().max_pages)?,
        };
        if limits.max_pages == 0 {
            return Err(ConfigError::Invalid {
                key: "FETCH_MAX_PAGES",
                message: "must be at least 1".into(),
            });
        }

        let timestamp = match lookup("EXPORT_TIMESTAMP").as_deref().map(str::trim) {
            None | Some("") | Some("original") => TimestampColumn::Original,
            Some("utc") => TimestampColumn::Utc,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "EXPORT_TIMESTAMP",
                    message: format!("expected `original` or `utc`, got {other:?}"),
                })
            }
        };

        Ok(Config {
            queries,
            mail,
            fetch_timeout: Duration::from_secs(parse_or(&lookup, "FETCH_TIMEOUT_SECS", 30)?),
            retry,
            limits,
            export_dir: lookup("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            timestamp,
            keep_exports: parse_or(&lookup, "KEEP_EXPORTS", false)?,
        })
    }
}

/// `{"name": "https://..."}`. Names come back sorted so runs are repeatable.
pub fn parse_queries(raw: &str) -> Result<Vec<Query>, ConfigError> {
    let invalid = |message: String| ConfigError::Invalid {
        key: QUERIES_ENV,
        message,
    };

    let map: BTreeMap<String, String> =
        serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;

    if map.is_empty() {
        return Err(invalid("no queries configured".into()));
    }

    map.into_iter()
        .map(|(name, start_url)| {
            let parsed = Url::parse(&start_url).map_err(|e| invalid(format!("{name}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(invalid(format!("{name}: unsupported scheme {}", parsed.scheme())));
            }
            Ok(Query { name, start_url })
        })
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(v) if !v.trim().is_empty() => v.trim().parse().map_err(|e: T::Err| {
            ConfigError::Invalid {
                key,
                message: e.to_string(),
            }
        }),
        _ => Ok(default),
    }
}
