pub mod export_xlsx;
pub mod table;

pub use export_xlsx::{export_file_name, export_listings_xlsx, write_export, ExportError};
pub use table::{Cell, ListingTable, TimestampColumn, FIXED_HEADERS};
