use std::path::Path;

use anyhow::{Context, Result};

use crate::infra::import::csv::read_csv_rows;
use crate::usecase::services::mutation_gateway::MutationGateway;

pub struct ImportService {
    gateway: MutationGateway,
}

impl ImportService {
    pub fn new(gateway: MutationGateway) -> Self {
        Self { gateway }
    }

    /// Inserts every CSV record into the grid table, then refetches once.
    /// Returns the number of inserted rows.
    pub async fn import_csv(&self, path: &Path) -> Result<usize> {
        let rows = read_csv_rows(path)?;
        let row_count = rows.len();
        let table = self.gateway.store().table().to_string();

        let result = self
            .gateway
            .remote(move |source| {
                for row in rows {
                    source.insert(&table, row)?;
                }
                Ok(())
            })
            .await;
        self.gateway
            .finish("import", result)
            .await
            .with_context(|| format!("failed to import csv: {}", path.display()))?;

        Ok(row_count)
    }
}
