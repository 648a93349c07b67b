use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    Connection::open(db_path).with_context(|| format!("failed to open db: {}", db_path.display()))
}

pub fn init_db(db_path: &Path, table: &str) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            id      INTEGER PRIMARY KEY AUTOINCREMENT,
            name    TEXT,
            domain  TEXT,
            url     TEXT
        );
        ",
        table = quote_ident(table)
    ))
    .context("failed to initialize schema")?;

    Ok(())
}

/// Double-quoted SQL identifier; column names such as `logo(img)` or
/// `new column(1)` are legal only in this form.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column names of `table` in declaration order.
pub fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))
        .context("failed to prepare table_info")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .context("failed to query table_info")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect table columns")?;

    if columns.is_empty() {
        anyhow::bail!("table not found: {table}")
    }
    Ok(columns)
}
