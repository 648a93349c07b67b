use crate::domain::entities::row::ID_COLUMN;

/// Name suffix that marks a text column as holding avatar image URLs.
pub const IMAGE_MARKER: &str = "(img)";
pub const OPERATION_COLUMN: &str = "operation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Identifier,
    TextEditable,
    ImageUrl,
    Operation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub title: String,
    pub key: String,
    pub kind: ColumnKind,
    pub editable: bool,
}

impl ColumnDescriptor {
    pub fn identifier() -> Self {
        Self {
            title: ID_COLUMN.to_string(),
            key: ID_COLUMN.to_string(),
            kind: ColumnKind::Identifier,
            editable: false,
        }
    }

    pub fn text(key: &str) -> Self {
        Self {
            title: key.to_string(),
            key: key.to_string(),
            kind: ColumnKind::TextEditable,
            editable: true,
        }
    }

    /// Dynamic column: image-typed when the raw name carries the marker.
    pub fn dynamic(key: &str) -> Self {
        match key.strip_suffix(IMAGE_MARKER) {
            Some(title) => Self {
                title: title.to_string(),
                key: key.to_string(),
                kind: ColumnKind::ImageUrl,
                editable: true,
            },
            None => Self::text(key),
        }
    }

    pub fn operation() -> Self {
        Self {
            title: OPERATION_COLUMN.to_string(),
            key: OPERATION_COLUMN.to_string(),
            kind: ColumnKind::Operation,
            editable: false,
        }
    }

    pub fn is_image(&self) -> bool {
        self.kind == ColumnKind::ImageUrl
    }
}

/// Statically declared editable columns, in display order.
pub fn known_columns() -> Vec<ColumnDescriptor> {
    ["name", "domain", "url"]
        .into_iter()
        .map(ColumnDescriptor::text)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRename {
    pub old_name: String,
    pub new_name: String,
}

/// Scalar kinds offered by the add-column menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NewColumnKind {
    Text,
    Numeric,
    Date,
    Image,
}

impl NewColumnKind {
    pub const ALL: [NewColumnKind; 4] = [
        NewColumnKind::Text,
        NewColumnKind::Numeric,
        NewColumnKind::Date,
        NewColumnKind::Image,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NewColumnKind::Text => "text",
            NewColumnKind::Numeric => "number",
            NewColumnKind::Date => "date",
            NewColumnKind::Image => "image",
        }
    }

    /// Declared remote type. Images have no native type and are stored as text.
    pub fn remote_type(self) -> &'static str {
        match self {
            NewColumnKind::Text | NewColumnKind::Image => "text",
            NewColumnKind::Numeric => "numeric",
            NewColumnKind::Date => "date",
        }
    }

    /// Raw column name for a new column of this kind.
    pub fn raw_name(self, name: &str) -> String {
        if self == NewColumnKind::Image && !name.ends_with(IMAGE_MARKER) {
            format!("{name}{IMAGE_MARKER}")
        } else {
            name.to_string()
        }
    }
}
