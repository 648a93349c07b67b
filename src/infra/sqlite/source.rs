use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::domain::entities::query::{CountDescriptor, QueryDescriptor};
use crate::domain::entities::row::{Row, RowId};
use crate::infra::sqlite::queries::{
    add_column, count_rows, delete_row, insert_row, rename_column, select_rows, update_row,
    UnknownColumn, Unsupported,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::table_source::{
    ChangeEvent, ChangeKind, ProcedureCall, SourceError, TableSource,
};

const CHANGE_FEED_CAPACITY: usize = 64;

/// `TableSource` over a local SQLite file. Writes made through it are
/// announced on its change feed.
pub struct SqliteTableSource {
    pub db_path: PathBuf,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteTableSource {
    fn new(db_path: PathBuf) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { db_path, changes }
    }

    /// Creates the database file and the grid table when missing.
    pub fn open(db_path: PathBuf, table: &str) -> Result<Self, SourceError> {
        let source = Self::new(db_path);
        source.init(table)?;
        Ok(source)
    }

    fn init(&self, table: &str) -> Result<(), SourceError> {
        init_db(&self.db_path, table).map_err(to_source_error)
    }

    fn notify(&self, table: &str, kind: ChangeKind) {
        // No subscribers is not an error.
        let _ = self.changes.send(ChangeEvent::now(table, kind));
    }
}

fn to_source_error(err: anyhow::Error) -> SourceError {
    if let Some(UnknownColumn(column)) = err.downcast_ref::<UnknownColumn>() {
        return SourceError::UnknownColumn(column.clone());
    }
    if let Some(Unsupported(what)) = err.downcast_ref::<Unsupported>() {
        return SourceError::Unsupported(what.clone());
    }
    SourceError::Message(format!("{err:#}"))
}

impl TableSource for SqliteTableSource {
    fn select(&self, query: &QueryDescriptor) -> Result<Vec<Row>, SourceError> {
        select_rows(&self.db_path, query).map_err(to_source_error)
    }

    fn count(&self, query: &CountDescriptor) -> Result<u64, SourceError> {
        count_rows(&self.db_path, query).map_err(to_source_error)
    }

    fn insert(&self, table: &str, row: Row) -> Result<Row, SourceError> {
        let inserted = insert_row(&self.db_path, table, &row).map_err(to_source_error)?;
        self.notify(table, ChangeKind::Insert);
        Ok(inserted)
    }

    fn update(&self, table: &str, row: Row, id: RowId) -> Result<Row, SourceError> {
        let updated = update_row(&self.db_path, table, &row, id).map_err(to_source_error)?;
        self.notify(table, ChangeKind::Update);
        Ok(updated)
    }

    fn delete(&self, table: &str, id: RowId) -> Result<(), SourceError> {
        delete_row(&self.db_path, table, id).map_err(to_source_error)?;
        self.notify(table, ChangeKind::Delete);
        Ok(())
    }

    fn call_procedure(&self, call: &ProcedureCall) -> Result<(), SourceError> {
        let result = match call {
            ProcedureCall::AddColumn(args) => add_column(&self.db_path, args),
            ProcedureCall::UpdateColumn(args) => rename_column(&self.db_path, args),
        };
        result.map_err(to_source_error)?;
        self.notify(call.table(), ChangeKind::Schema);
        Ok(())
    }

    fn subscribe(&self, _table: &str) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
