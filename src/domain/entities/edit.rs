use crate::domain::entities::column::ColumnDescriptor;
use crate::domain::entities::row::{Row, RowId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub row_id: RowId,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required { column: String },
    NotEditable { column: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Required { column } => write!(f, "{column} is required."),
            ValidationError::NotEditable { column } => write!(f, "{column} is not editable."),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks an inline edit before it leaves the cell editor. On error the
/// editor keeps the previous value.
pub fn validate_cell_edit(column: &ColumnDescriptor, value: &str) -> Result<String, ValidationError> {
    if !column.editable {
        return Err(ValidationError::NotEditable {
            column: column.title.clone(),
        });
    }
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            column: column.title.clone(),
        });
    }
    Ok(trimmed.to_string())
}

/// Merges one validated cell into a copy of the record, ready for a
/// full-row update.
pub fn apply_cell_edit(record: &Row, column: &str, value: String) -> Row {
    let mut next = record.clone();
    next.set(column, value);
    next
}
