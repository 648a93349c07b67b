use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::domain::entities::query::{CountDescriptor, QueryDescriptor};
use crate::domain::entities::row::{Row, RowId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    Message(String),
    UnknownColumn(String),
    Unsupported(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Message(message) => write!(f, "{message}"),
            SourceError::UnknownColumn(column) => write!(f, "unknown column: {column}"),
            SourceError::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Remote table behind the grid.
///
/// Calls are blocking; the grid store runs them on the blocking pool.
pub trait TableSource: Send + Sync {
    fn select(&self, query: &QueryDescriptor) -> Result<Vec<Row>, SourceError>;
    fn count(&self, query: &CountDescriptor) -> Result<u64, SourceError>;

    fn insert(&self, table: &str, row: Row) -> Result<Row, SourceError>;
    fn update(&self, table: &str, row: Row, id: RowId) -> Result<Row, SourceError>;
    fn delete(&self, table: &str, id: RowId) -> Result<(), SourceError>;
    fn call_procedure(&self, call: &ProcedureCall) -> Result<(), SourceError>;

    /// Change feed for `table`. Dropping the receiver unsubscribes.
    fn subscribe(&self, table: &str) -> broadcast::Receiver<ChangeEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Schema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn now(table: &str, kind: ChangeKind) -> Self {
        Self {
            table: table.to_string(),
            kind,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddColumnArgs {
    pub schema: String,
    pub table: String,
    pub column_name: String,
    pub column_type: String,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateColumnArgs {
    pub schema: String,
    pub table: String,
    pub old_name: String,
    pub new_name: String,
    pub column_type: String,
    pub is_array: bool,
}

/// Schema-altering remote procedures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcedureCall {
    AddColumn(AddColumnArgs),
    UpdateColumn(UpdateColumnArgs),
}

impl ProcedureCall {
    pub fn name(&self) -> &'static str {
        match self {
            ProcedureCall::AddColumn(_) => "add_column",
            ProcedureCall::UpdateColumn(_) => "update_column",
        }
    }

    pub fn table(&self) -> &str {
        match self {
            ProcedureCall::AddColumn(args) => &args.table,
            ProcedureCall::UpdateColumn(args) => &args.table,
        }
    }
}
