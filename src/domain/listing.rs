use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone, PartialEq)]
pub struct Price {
    pub value: f64,
    pub currency: String,
}

/// One entry of a listing's `params` list, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub key: String,
    pub label: Option<String>,
}

/// A single classified ad, flattened from one raw feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub url: String,
    pub title: String,

    // Kept verbatim so the export can choose its own representation.
    pub created_time: String,
    pub created_at: DateTime<FixedOffset>,

    pub city: Option<String>,
    pub district: Option<String>,
    pub region: Option<String>,

    pub price: Option<Price>,
    pub attributes: Vec<Attribute>,
}
