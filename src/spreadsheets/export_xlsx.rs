use crate::spreadsheets::table::{Cell, ListingTable};
use chrono::{DateTime, Utc};
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SHEET_NAME: &str = "listings";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("XLSX error: {0}")]
    Xlsx(String),
    #[error("I/O error on {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Renders the table as an in-memory workbook: one header row, then one row
/// per listing. Missing values stay blank.
pub fn export_listings_xlsx(table: &ListingTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| ExportError::Xlsx(format!("Failed to name sheet: {}", e)))?;

    // Headers
    for (col, header) in table.headers().iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .map_err(|e| {
                ExportError::Xlsx(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    // Rows
    for (i, row) in table.rows().iter().enumerate() {
        let r = (i + 1) as u32;

        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s).map_err(|e| {
                        ExportError::Xlsx(format!("Failed to write row {r} col {c}: {}", e))
                    })?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n).map_err(|e| {
                        ExportError::Xlsx(format!("Failed to write row {r} col {c}: {}", e))
                    })?;
                }
                Cell::Empty => {}
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ExportError::Xlsx(format!("Failed to save workbook: {}", e)))
}

/// Writes the workbook to `dir/<query>_<stamp>.xlsx` and returns the path.
pub fn write_export(
    table: &ListingTable,
    dir: &Path,
    query_name: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let buffer = export_listings_xlsx(table)?;

    std::fs::create_dir_all(dir).map_err(|e| ExportError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    })?;

    let path = dir.join(export_file_name(query_name, now));
    std::fs::write(&path, buffer).map_err(|e| ExportError::Io {
        path: path.clone(),
        message: e.to_string(),
    })?;

    Ok(path)
}

pub fn export_file_name(query_name: &str, now: DateTime<Utc>) -> String {
    let stem: String = query_name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "listings".to_string() } else { stem };

    format!("{stem}_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}
