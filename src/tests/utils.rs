use crate::config::{Config, Query};
use crate::mailer::{MailerConfig, MailerError, Notifier, Report};
use crate::scraper::{FetchLimits, FetchResponse, PageFetcher, RetryPolicy, ScraperError};
use crate::spreadsheets::TimestampColumn;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum Step {
    Reply(u16, String),
    NetworkDown,
}

/// Serves canned responses per URL. A route's last step repeats forever;
/// unknown URLs get a 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    routes: RefCell<HashMap<String, VecDeque<Step>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: Value) -> Self {
        self.steps(url, vec![Step::Reply(200, body.to_string())])
    }

    pub fn raw(self, url: &str, status: u16, body: &str) -> Self {
        self.steps(url, vec![Step::Reply(status, body.to_string())])
    }

    pub fn steps(self, url: &str, steps: Vec<Step>) -> Self {
        self.routes
            .borrow_mut()
            .insert(url.to_string(), steps.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|u| *u == url).count()
    }
}

impl PageFetcher for ScriptedFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse, ScraperError> {
        self.calls.borrow_mut().push(url.to_string());

        let mut routes = self.routes.borrow_mut();
        let step = match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match step {
            Some(Step::Reply(status, body)) => Ok(FetchResponse { status, body }),
            Some(Step::NetworkDown) => Err(ScraperError::Network("connection refused".into())),
            None => Ok(FetchResponse {
                status: 404,
                body: String::new(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentReport {
    pub subject: String,
    pub listings: usize,
    pub pages: usize,
    pub attachment: PathBuf,
    pub attachment_bytes: usize,
}

/// Records every report; fails for the subjects it is told to.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<SentReport>>,
    pub fail_subjects: Vec<String>,
}

impl RecordingNotifier {
    pub fn failing_for(subject: &str) -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            fail_subjects: vec![subject.to_string()],
        }
    }
}

impl Notifier for RecordingNotifier {
    fn send_report(&self, report: &Report<'_>) -> Result<(), MailerError> {
        if self.fail_subjects.iter().any(|s| s == report.subject) {
            return Err(MailerError::ApiError {
                status: 401,
                body: "unauthorized".into(),
            });
        }

        let bytes = std::fs::read(report.attachment).map_err(|e| MailerError::Attachment {
            path: report.attachment.display().to_string(),
            message: e.to_string(),
        })?;

        self.sent.borrow_mut().push(SentReport {
            subject: report.subject.to_string(),
            listings: report.listings,
            pages: report.pages,
            attachment: report.attachment.to_path_buf(),
            attachment_bytes: bytes.len(),
        });
        Ok(())
    }
}

/// Fresh, unique directory under the system temp dir.
pub fn temp_export_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "olx_notifier_{label}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

pub fn test_config(queries: &[(&str, &str)], export_dir: PathBuf) -> Config {
    Config {
        queries: queries
            .iter()
            .map(|(name, url)| Query {
                name: name.to_string(),
                start_url: url.to_string(),
            })
            .collect(),
        mail: MailerConfig {
            api_url: "http://localhost/mail".into(),
            api_key: "test".into(),
            sender_email: "bot@example.com".into(),
            sender_name: "Bot".into(),
            recipient_email: "me@example.com".into(),
        },
        fetch_timeout: Duration::from_secs(1),
        retry: RetryPolicy::immediate(3),
        limits: FetchLimits::default(),
        export_dir,
        timestamp: TimestampColumn::Original,
        keep_exports: false,
    }
}

pub fn entry(url: &str, title: &str, created_time: &str) -> Value {
    json!({
        "url": url,
        "title": title,
        "created_time": created_time,
        "location": {
            "city": { "name": "Łódź" },
            "district": { "name": "Bałuty" },
            "region": { "name": "Łódzkie" }
        },
        "params": []
    })
}

pub fn price_param(value: f64, currency: &str) -> Value {
    json!({
        "key": "price",
        "value": { "value": value, "currency": currency, "label": format!("{value} {currency}") }
    })
}

pub fn label_param(key: &str, label: &str) -> Value {
    json!({ "key": key, "value": { "key": label, "label": label } })
}

pub fn page(entries: Vec<Value>, next: Option<&str>) -> Value {
    match next {
        Some(href) => json!({ "data": entries, "links": { "next": { "href": href } } }),
        None => json!({ "data": entries }),
    }
}
