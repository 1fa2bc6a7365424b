pub mod listing;
pub mod normalizer;

pub use listing::{Attribute, Listing, Price};
pub use normalizer::{normalize_pages, parse_created_time, Listings, NormalizeError};
