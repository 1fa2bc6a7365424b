// src/mailer.rs

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::info;
use reqwest::blocking::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const BREVO_API_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("Cannot attach {path}: {message}")]
    Attachment { path: String, message: String },
}

/// A finished export on its way to the recipient.
#[derive(Debug, Clone)]
pub struct Report<'a> {
    pub subject: &'a str,
    pub listings: usize,
    pub pages: usize,
    pub attachment: &'a Path,
}

pub trait Notifier {
    fn send_report(&self, report: &Report<'_>) -> Result<(), MailerError>;
}

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: String,
    pub recipient_email: String,
}

pub struct BrevoMailer {
    cfg: MailerConfig,
    client: Client,
}

#[derive(Serialize)]
struct BrevoSender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoRecipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct BrevoAttachment {
    name: String,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoPayload<'a> {
    sender: BrevoSender<'a>,
    to: Vec<BrevoRecipient<'a>>,
    subject: &'a str,
    html_content: String,
    attachment: Vec<BrevoAttachment>,
}

impl BrevoMailer {
    pub fn new(cfg: MailerConfig, timeout: Duration) -> Result<Self, MailerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        Ok(Self { cfg, client })
    }

    fn build_payload<'a>(
        &'a self,
        report: &Report<'a>,
        file_bytes: &[u8],
    ) -> BrevoPayload<'a> {
        let file_name = report
            .attachment
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "listings.xlsx".to_string());

        BrevoPayload {
            sender: BrevoSender {
                name: &self.cfg.sender_name,
                email: &self.cfg.sender_email,
            },
            to: vec![BrevoRecipient {
                email: &self.cfg.recipient_email,
            }],
            subject: report.subject,
            html_content: render_body(report),
            attachment: vec![BrevoAttachment {
                name: file_name,
                content: STANDARD.encode(file_bytes),
            }],
        }
    }
}

impl Notifier for BrevoMailer {
    fn send_report(&self, report: &Report<'_>) -> Result<(), MailerError> {
        let bytes = std::fs::read(report.attachment).map_err(|e| MailerError::Attachment {
            path: report.attachment.display().to_string(),
            message: e.to_string(),
        })?;

        let payload = self.build_payload(report, &bytes);

        let resp = self
            .client
            .post(&self.cfg.api_url)
            .header("api-key", &self.cfg.api_key)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
            return Err(MailerError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        info!(
            "📧 Sent \"{}\" to {} ({} listings)",
            report.subject, self.cfg.recipient_email, report.listings
        );
        Ok(())
    }
}

fn render_body(report: &Report<'_>) -> String {
    format!(
        r#"
        <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <h2>{subject}</h2>
                <p>{listings} listings collected from {pages} pages.</p>
                <p>The full table is attached.</p>
            </body>
        </html>
        "#,
        subject = escape_html(report.subject),
        listings = report.listings,
        pages = report.pages,
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
