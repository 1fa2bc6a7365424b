use serde::Deserialize;
use serde_json::Value;

// page
//  ├── data[]
//  │    ├── url
//  │    ├── title
//  │    ├── created_time
//  │    ├── location
//  │    │    ├── city     { name }
//  │    │    ├── district { name }
//  │    │    └── region   { name }
//  │    └── params[]
//  │         ├── key
//  │         └── value
//  │              ├── label
//  │              ├── value
//  │              └── currency
//  └── links
//       └── next { href }
//
// Entry fields stay optional at this layer. The normalizer decides which
// ones are mandatory and names the entry that broke the contract.

#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub data: Vec<RawEntry>,
    #[serde(default)]
    pub links: Option<Links>,
}

impl Page {
    /// `links.next.href`, if the server handed us a continuation.
    pub fn next_href(&self) -> Option<&str> {
        self.links
            .as_ref()
            .and_then(|l| l.next.as_ref())
            .and_then(|n| n.href.as_deref())
            .filter(|href| !href.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub next: Option<NextLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextLink {
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub location: Option<RawLocation>,
    /// `null` and absent both mean no params.
    #[serde(default)]
    pub params: Option<Vec<RawParam>>,
}

impl RawEntry {
    pub fn params(&self) -> &[RawParam] {
        self.params.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub city: Option<NamedRef>,
    #[serde(default)]
    pub district: Option<NamedRef>,
    #[serde(default)]
    pub region: Option<NamedRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParam {
    pub key: String,
    #[serde(default)]
    pub value: Option<RawParamValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawParamValue {
    #[serde(default)]
    pub label: Option<String>,
    /// Numeric for `price`, a string key for most other params.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawParamValue {
    pub fn amount(&self) -> Option<f64> {
        self.value.as_ref().and_then(Value::as_f64)
    }
}
