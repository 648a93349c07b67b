use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Connection};

use crate::domain::entities::query::{CountDescriptor, LikeFilter, QueryDescriptor};
use crate::domain::entities::row::{CellValue, Row, RowId, ID_COLUMN};
use crate::infra::sqlite::schema::{open_connection, quote_ident, table_columns};
use crate::usecase::ports::table_source::{AddColumnArgs, UpdateColumnArgs};

const SQLITE_SCHEMA_ALIASES: [&str; 2] = ["public", "main"];
const COLUMN_TYPES: [&str; 6] = ["text", "numeric", "date", "integer", "real", "boolean"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColumn(pub String);

impl std::fmt::Display for UnknownColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown column: {}", self.0)
    }
}

impl std::error::Error for UnknownColumn {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsupported(pub String);

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported: {}", self.0)
    }
}

impl std::error::Error for Unsupported {}

fn ensure_column(columns: &[String], name: &str) -> Result<()> {
    if columns.iter().any(|column| column == name) {
        Ok(())
    } else {
        Err(UnknownColumn(name.to_string()).into())
    }
}

/// NULL cells compare as empty text, so the match-all pattern keeps them.
fn where_like(filter: &LikeFilter) -> String {
    format!(
        "COALESCE({}, '') LIKE ? ESCAPE '\\'",
        quote_ident(&filter.field)
    )
}

fn to_sql_value(value: &CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Integer(value) => Value::Integer(*value),
        CellValue::Real(value) => Value::Real(*value),
        CellValue::Text(value) => Value::Text(value.clone()),
    }
}

fn from_sql_value(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Integer(value) => CellValue::Integer(value),
        Value::Real(value) => CellValue::Real(value),
        Value::Text(value) => CellValue::Text(value),
        Value::Blob(bytes) => CellValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

fn collect_rows(conn: &Connection, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql).context("failed to prepare row query")?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt
        .query_map(rusqlite::params_from_iter(params), |sql_row| {
            let mut row = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let value: Value = sql_row.get(idx)?;
                row.set(name.as_str(), from_sql_value(value));
            }
            Ok(row)
        })
        .context("failed to run row query")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect rows")?;

    Ok(rows)
}

fn load_row(conn: &Connection, table: &str, id: i64) -> Result<Row> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(ID_COLUMN)
    );
    collect_rows(conn, &sql, vec![Value::Integer(id)])?
        .into_iter()
        .next()
        .with_context(|| format!("no row with id {id} in {table}"))
}

pub fn select_rows(db_path: &Path, query: &QueryDescriptor) -> Result<Vec<Row>> {
    let conn = open_connection(db_path)?;
    let columns = table_columns(&conn, &query.table)?;
    ensure_column(&columns, &query.order_by.field)?;
    ensure_column(&columns, &query.filter.field)?;

    let direction = if query.order_by.ascending { "ASC" } else { "DESC" };
    let sql = format!(
        "SELECT * FROM {table} WHERE {filter} ORDER BY {order} {direction} LIMIT ? OFFSET ?",
        table = quote_ident(&query.table),
        filter = where_like(&query.filter),
        order = quote_ident(&query.order_by.field),
    );
    let limit = i64::try_from(query.limit).context("limit out of range")?;
    let offset = i64::try_from(query.offset).context("offset out of range")?;

    collect_rows(
        &conn,
        &sql,
        vec![
            Value::Text(query.filter.pattern.clone()),
            Value::Integer(limit),
            Value::Integer(offset),
        ],
    )
}

pub fn count_rows(db_path: &Path, query: &CountDescriptor) -> Result<u64> {
    let conn = open_connection(db_path)?;
    let columns = table_columns(&conn, &query.table)?;
    ensure_column(&columns, &query.filter.field)?;

    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        quote_ident(&query.table),
        where_like(&query.filter)
    );
    let total: i64 = conn
        .query_row(&sql, params![query.filter.pattern], |row| row.get(0))
        .context("failed to query filtered row count")?;

    Ok(u64::try_from(total).unwrap_or_default())
}

pub fn insert_row(db_path: &Path, table: &str, row: &Row) -> Result<Row> {
    let conn = open_connection(db_path)?;
    let columns = table_columns(&conn, table)?;

    let cells: Vec<(&str, &CellValue)> = row.iter().filter(|(name, _)| *name != ID_COLUMN).collect();
    for (name, _) in &cells {
        ensure_column(&columns, name)?;
    }

    if cells.is_empty() {
        conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table)), [])
            .context("failed to insert empty row")?;
    } else {
        let names = cells
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = std::iter::repeat_n("?", cells.len())
            .collect::<Vec<_>>()
            .join(", ");
        conn.execute(
            &format!(
                "INSERT INTO {} ({names}) VALUES ({placeholders})",
                quote_ident(table)
            ),
            rusqlite::params_from_iter(cells.iter().map(|(_, value)| to_sql_value(value))),
        )
        .context("failed to insert row")?;
    }

    load_row(&conn, table, conn.last_insert_rowid())
}

pub fn update_row(db_path: &Path, table: &str, row: &Row, id: RowId) -> Result<Row> {
    let conn = open_connection(db_path)?;
    let columns = table_columns(&conn, table)?;

    let cells: Vec<(&str, &CellValue)> = row.iter().filter(|(name, _)| *name != ID_COLUMN).collect();
    for (name, _) in &cells {
        ensure_column(&columns, name)?;
    }

    if !cells.is_empty() {
        let assignments = cells
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_ident(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<Value> = cells.iter().map(|(_, value)| to_sql_value(value)).collect();
        values.push(Value::Integer(id.0));

        conn.execute(
            &format!(
                "UPDATE {} SET {assignments} WHERE {} = ?",
                quote_ident(table),
                quote_ident(ID_COLUMN)
            ),
            rusqlite::params_from_iter(values),
        )
        .with_context(|| format!("failed to update row #{id}"))?;
    }

    load_row(&conn, table, id.0)
}

pub fn delete_row(db_path: &Path, table: &str, id: RowId) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(ID_COLUMN)
        ),
        params![id.0],
    )
    .with_context(|| format!("failed to delete row #{id}"))?;
    Ok(())
}

fn ensure_ddl_target(schema: &str, column_type: &str, is_array: bool) -> Result<String> {
    if !SQLITE_SCHEMA_ALIASES.contains(&schema) {
        return Err(Unsupported(format!("schema {schema}")).into());
    }
    if is_array {
        return Err(Unsupported("array columns".to_string()).into());
    }
    let column_type = column_type.trim().to_ascii_lowercase();
    if !COLUMN_TYPES.contains(&column_type.as_str()) {
        return Err(Unsupported(format!("column type {column_type}")).into());
    }
    Ok(column_type.to_ascii_uppercase())
}

pub fn add_column(db_path: &Path, args: &AddColumnArgs) -> Result<()> {
    let column_type = ensure_ddl_target(&args.schema, &args.column_type, args.is_array)?;
    if args.column_name.trim().is_empty() {
        anyhow::bail!("column name is required")
    }

    let conn = open_connection(db_path)?;
    table_columns(&conn, &args.table)?;
    conn.execute(
        &format!(
            "ALTER TABLE {} ADD COLUMN {} {column_type}",
            quote_ident(&args.table),
            quote_ident(&args.column_name)
        ),
        [],
    )
    .with_context(|| format!("failed to add column {}", args.column_name))?;
    Ok(())
}

/// SQLite cannot retype a column in place, so the declared type is only
/// validated.
pub fn rename_column(db_path: &Path, args: &UpdateColumnArgs) -> Result<()> {
    ensure_ddl_target(&args.schema, &args.column_type, args.is_array)?;
    if args.old_name == ID_COLUMN {
        return Err(Unsupported("renaming the id column".to_string()).into());
    }
    if args.new_name.trim().is_empty() {
        anyhow::bail!("column name is required")
    }

    let conn = open_connection(db_path)?;
    let columns = table_columns(&conn, &args.table)?;
    ensure_column(&columns, &args.old_name)?;
    conn.execute(
        &format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_ident(&args.table),
            quote_ident(&args.old_name),
            quote_ident(&args.new_name)
        ),
        [],
    )
    .with_context(|| format!("failed to rename column {} to {}", args.old_name, args.new_name))?;
    Ok(())
}
