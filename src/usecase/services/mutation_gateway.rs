use std::sync::Arc;

use crate::domain::entities::column::NewColumnKind;
use crate::domain::entities::row::{Row, RowId, ID_COLUMN};
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::table_source::{
    AddColumnArgs, ProcedureCall, SourceError, TableSource, UpdateColumnArgs,
};
use crate::usecase::services::grid_store::GridStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    Remote(SourceError),
    MissingId,
    Unavailable(String),
}

impl std::fmt::Display for MutationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationError::Remote(err) => write!(f, "{err}"),
            MutationError::MissingId => write!(f, "row has no id"),
            MutationError::Unavailable(message) => write!(f, "data source unavailable: {message}"),
        }
    }
}

impl std::error::Error for MutationError {}

/// Write path of the grid. Every operation refetches afterwards, whether the
/// remote call succeeded or not, and then reports the remote outcome.
#[derive(Clone)]
pub struct MutationGateway {
    source: Arc<dyn TableSource>,
    store: GridStore,
    schema: String,
}

impl MutationGateway {
    pub fn new(source: Arc<dyn TableSource>, store: GridStore, schema: impl Into<String>) -> Self {
        Self {
            source,
            store,
            schema: schema.into(),
        }
    }

    /// Inserts without an id; the assigned id shows up on refetch.
    pub async fn create(&self, row: Row) -> Result<(), MutationError> {
        let table = self.table();
        let row = row.without(ID_COLUMN);
        let result = self
            .remote(move |source| source.insert(&table, row).map(|_| ()))
            .await;
        self.finish("insert", result).await
    }

    pub async fn update(&self, row: Row) -> Result<(), MutationError> {
        let result = match row.id() {
            Some(id) => {
                let table = self.table();
                self.remote(move |source| source.update(&table, row, id).map(|_| ()))
                    .await
            }
            None => Err(MutationError::MissingId),
        };
        self.finish("update", result).await
    }

    pub async fn delete(&self, id: RowId) -> Result<(), MutationError> {
        let table = self.table();
        let result = self.remote(move |source| source.delete(&table, id)).await;
        self.finish("delete", result).await
    }

    /// Plain rename declared as text; callers keep any image marker in
    /// `new_name` themselves.
    pub async fn rename_column(&self, old_name: &str, new_name: &str) -> Result<(), MutationError> {
        let call = ProcedureCall::UpdateColumn(UpdateColumnArgs {
            schema: self.schema.clone(),
            table: self.table(),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            column_type: "text".to_string(),
            is_array: false,
        });
        let result = self.remote(move |source| source.call_procedure(&call)).await;
        self.finish("update_column", result).await
    }

    pub async fn add_column(&self, name: &str, kind: NewColumnKind) -> Result<(), MutationError> {
        let call = ProcedureCall::AddColumn(AddColumnArgs {
            schema: self.schema.clone(),
            table: self.table(),
            column_name: kind.raw_name(name),
            column_type: kind.remote_type().to_string(),
            is_array: false,
        });
        let result = self.remote(move |source| source.call_procedure(&call)).await;
        self.finish("add_column", result).await
    }

    pub(crate) async fn remote<F>(&self, call: F) -> Result<(), MutationError>
    where
        F: FnOnce(&dyn TableSource) -> Result<(), SourceError> + Send + 'static,
    {
        let source = self.source.clone();
        match run_blocking(move || call(source.as_ref())).await {
            Ok(result) => result.map_err(MutationError::Remote),
            Err(err) => Err(MutationError::Unavailable(err.to_string())),
        }
    }

    pub(crate) async fn finish(
        &self,
        operation: &'static str,
        result: Result<(), MutationError>,
    ) -> Result<(), MutationError> {
        match &result {
            Ok(()) => tracing::debug!(table = %self.store.table(), operation, "mutation applied"),
            Err(err) => {
                tracing::warn!(table = %self.store.table(), operation, error = %err, "mutation failed")
            }
        }
        // Fetch failures land in the store snapshot.
        if let Err(err) = self.store.refetch().await {
            tracing::debug!(table = %self.store.table(), operation, error = %err, "refetch after mutation failed");
        }
        result
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    fn table(&self) -> String {
        self.store.table().to_string()
    }
}
