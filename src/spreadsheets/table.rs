use crate::domain::{Listing, NormalizeError};
use std::collections::HashMap;

pub const FIXED_HEADERS: [&str; 8] = [
    "url",
    "title",
    "created_time",
    "city",
    "district",
    "region",
    "price_val",
    "price_cur",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// How `created_time` lands in the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampColumn {
    /// The string exactly as the feed sent it.
    #[default]
    Original,
    /// `YYYY-MM-DD HH:MM:SS`, converted to UTC.
    Utc,
}

/// Header row plus one row per listing. Attribute columns are appended in
/// the order their keys are first seen.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    column_of: HashMap<String, usize>,
}

impl ListingTable {
    pub fn new() -> Self {
        let headers: Vec<String> = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
        let column_of = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        Self {
            headers,
            rows: Vec::new(),
            column_of,
        }
    }

    /// Drains a listing stream into a finished table, stopping at the first
    /// normalization error.
    pub fn from_listings<I>(
        listings: I,
        timestamp: TimestampColumn,
    ) -> Result<Self, NormalizeError>
    where
        I: IntoIterator<Item = Result<Listing, NormalizeError>>,
    {
        let mut table = Self::new();
        for listing in listings {
            table.push(&listing?, timestamp);
        }
        Ok(table.finish())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` under `header`, if both exist.
    #[cfg(test)]
    pub fn cell(&self, row: usize, header: &str) -> Option<&Cell> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn push(&mut self, listing: &Listing, timestamp: TimestampColumn) {
        let created = match timestamp {
            TimestampColumn::Original => listing.created_time.clone(),
            TimestampColumn::Utc => listing
                .created_at
                .naive_utc()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        };

        let mut row = vec![
            Cell::Text(listing.url.clone()),
            Cell::Text(listing.title.clone()),
            Cell::Text(created),
            Cell::text(listing.city.as_deref()),
            Cell::text(listing.district.as_deref()),
            Cell::text(listing.region.as_deref()),
            listing
                .price
                .as_ref()
                .map_or(Cell::Empty, |p| Cell::Number(p.value)),
            Cell::text(listing.price.as_ref().map(|p| p.currency.as_str())),
        ];

        for attr in &listing.attributes {
            let col = self.attribute_column(&attr.key);
            if row.len() <= col {
                row.resize(col + 1, Cell::Empty);
            }
            // Repeated keys within one listing: the later label stays.
            row[col] = Cell::text(attr.label.as_deref());
        }

        self.rows.push(row);
    }

    fn attribute_column(&mut self, key: &str) -> usize {
        let header = if FIXED_HEADERS.contains(&key) {
            format!("param_{key}")
        } else {
            key.to_string()
        };

        if let Some(col) = self.column_of.get(&header) {
            return *col;
        }

        let col = self.headers.len();
        self.column_of.insert(header.clone(), col);
        self.headers.push(header);
        col
    }

    /// Pads every row out to the final header width.
    pub fn finish(mut self) -> Self {
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, Cell::Empty);
        }
        self
    }
}

impl Default for ListingTable {
    fn default() -> Self {
        Self::new()
    }
}
