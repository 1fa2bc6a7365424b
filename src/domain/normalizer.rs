// src/domain/normalizer.rs

use crate::domain::listing::{Attribute, Listing, Price};
use crate::scraper::models::{NamedRef, Page, RawEntry};
use chrono::{DateTime, FixedOffset};
use thiserror::Error;

const CREATED_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const PRICE_KEY: &str = "price";

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Malformed entry {}: missing {field}", .url.as_deref().unwrap_or("<no url>"))]
    MalformedEntry {
        url: Option<String>,
        field: &'static str,
    },
    #[error("Bad timestamp {value:?} on entry {url}")]
    BadTimestamp { url: String, value: String },
}

impl Listing {
    /// Flattens one raw feed entry. `url`, `title` and `created_time` must be
    /// present and non-empty; everything else degrades to `None`.
    pub fn from_raw_entry(entry: &RawEntry) -> Result<Self, NormalizeError> {
        let url = entry
            .url
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(NormalizeError::MalformedEntry {
                url: None,
                field: "url",
            })?
            .to_string();

        let missing = |field: &'static str| NormalizeError::MalformedEntry {
            url: Some(url.clone()),
            field,
        };

        let title = entry
            .title
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("title"))?
            .to_string();

        let created_time = entry
            .created_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("created_time"))?
            .to_string();

        let created_at =
            parse_created_time(&created_time).ok_or_else(|| NormalizeError::BadTimestamp {
                url: url.clone(),
                value: created_time.clone(),
            })?;

        let location = entry.location.as_ref();
        let name_of = |r: Option<&NamedRef>| r.and_then(|n| n.name.clone());

        let mut price = None;
        let params = entry.params();
        let mut attributes = Vec::with_capacity(params.len());
        for param in params {
            let value = param.value.as_ref();

            if param.key == PRICE_KEY {
                let parsed = value.and_then(|v| {
                    Some(Price {
                        value: v.amount()?,
                        currency: v.currency.clone()?,
                    })
                });
                // Last parsed price wins.
                if parsed.is_some() {
                    price = parsed;
                }
            }

            attributes.push(Attribute {
                key: param.key.clone(),
                label: value.and_then(|v| v.label.clone()),
            });
        }

        Ok(Listing {
            url,
            title,
            created_time,
            created_at,
            city: name_of(location.and_then(|l| l.city.as_ref())),
            district: name_of(location.and_then(|l| l.district.as_ref())),
            region: name_of(location.and_then(|l| l.region.as_ref())),
            price,
            attributes,
        })
    }
}

/// Accepts exactly `YYYY-MM-DDTHH:MM:SS±HHMM`.
pub fn parse_created_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let bytes = raw.as_bytes();
    if bytes.len() != 24 {
        return None;
    }

    let shape_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        10 => *b == b'T',
        13 | 16 => *b == b':',
        19 => *b == b'+' || *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }

    DateTime::parse_from_str(raw, CREATED_TIME_FORMAT).ok()
}

/// Lazy, single-pass walk over every entry of every page, in page order.
/// Stops for good after the first error.
pub struct Listings {
    pages: std::vec::IntoIter<Page>,
    entries: std::vec::IntoIter<RawEntry>,
    failed: bool,
}

pub fn normalize_pages(pages: Vec<Page>) -> Listings {
    Listings {
        pages: pages.into_iter(),
        entries: Vec::new().into_iter(),
        failed: false,
    }
}

impl Iterator for Listings {
    type Item = Result<Listing, NormalizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            if let Some(entry) = self.entries.next() {
                let result = Listing::from_raw_entry(&entry);
                self.failed = result.is_err();
                return Some(result);
            }

            let page = self.pages.next()?;
            self.entries = page.data.into_iter();
        }
    }
}
