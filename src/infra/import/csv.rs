use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::entities::row::{Row, ID_COLUMN};

/// Reads a headered CSV into insertable rows. An `id` column is dropped so
/// the data source assigns ids.
pub fn read_csv_rows(csv_path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .clone();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        let mut row = Row::new();
        for (col_idx, header) in headers.iter().enumerate() {
            let header = header.trim();
            if header.is_empty() || header == ID_COLUMN {
                continue;
            }
            row.set(header, record.get(col_idx).unwrap_or(""));
        }
        rows.push(row);
    }

    Ok(rows)
}
