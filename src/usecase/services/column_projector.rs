//! Display columns derived from the shape of the first fetched row.

use crate::domain::entities::column::{ColumnDescriptor, ColumnKind, ColumnRename, IMAGE_MARKER};
use crate::domain::entities::row::{Row, ID_COLUMN};

/// Orders columns as: identifier, known columns present on the row (declared
/// order), remaining row keys (encounter order), then the operation column.
pub fn project(sample: Option<&Row>, known: &[ColumnDescriptor]) -> Vec<ColumnDescriptor> {
    let Some(sample) = sample else {
        return Vec::new();
    };

    let mut columns = Vec::with_capacity(sample.keys().count() + 2);
    columns.push(ColumnDescriptor::identifier());

    for column in known {
        if column.key != ID_COLUMN && sample.get(&column.key).is_some() {
            columns.push(column.clone());
        }
    }

    for key in sample.keys() {
        if key == ID_COLUMN || is_known(known, key) {
            continue;
        }
        columns.push(ColumnDescriptor::dynamic(key));
    }

    columns.push(ColumnDescriptor::operation());
    columns
}

/// Whether the header of `column` may be renamed from the grid.
pub fn is_renamable(column: &ColumnDescriptor, known: &[ColumnDescriptor]) -> bool {
    matches!(column.kind, ColumnKind::TextEditable | ColumnKind::ImageUrl)
        && !is_known(known, &column.key)
}

/// Builds the rename for a new display title. Image-typed columns get the
/// marker back, since the kind lives only in the column name.
pub fn rename_request(
    column: &ColumnDescriptor,
    new_title: &str,
    known: &[ColumnDescriptor],
) -> Option<ColumnRename> {
    if !is_renamable(column, known) {
        return None;
    }
    let title = new_title.trim();
    if title.is_empty() {
        return None;
    }

    let new_name = if column.is_image() && !title.ends_with(IMAGE_MARKER) {
        format!("{title}{IMAGE_MARKER}")
    } else {
        title.to_string()
    };
    if new_name == column.key {
        return None;
    }

    Some(ColumnRename {
        old_name: column.key.clone(),
        new_name,
    })
}

/// Name for the `seq`-th column added from the grid.
pub fn new_column_name(seq: u32) -> String {
    format!("new column({seq})")
}

fn is_known(known: &[ColumnDescriptor], key: &str) -> bool {
    known.iter().any(|column| column.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::column::{known_columns, NewColumnKind};

    fn sample() -> Row {
        Row::new()
            .with("id", 1)
            .with("name", "Acme")
            .with("domain", "acme.com")
            .with("url", "acme.com/logo")
            .with("logo(img)", "")
    }

    #[test]
    fn no_sample_row_projects_nothing() {
        assert!(project(None, &known_columns()).is_empty());
    }

    #[test]
    fn projects_id_known_dynamic_then_operation() {
        let columns = project(Some(&sample()), &known_columns());
        let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "name", "domain", "url", "logo(img)", "operation"]);

        assert_eq!(columns[0].kind, ColumnKind::Identifier);
        assert!(!columns[0].editable);
        assert_eq!(columns[4].title, "logo");
        assert_eq!(columns[4].kind, ColumnKind::ImageUrl);
        assert_eq!(columns[5].kind, ColumnKind::Operation);
        assert!(!columns[5].editable);
    }

    #[test]
    fn known_columns_keep_declared_order_regardless_of_row_order() {
        let row = Row::new()
            .with("url", "u")
            .with("extra", "x")
            .with("id", 2)
            .with("domain", "d")
            .with("name", "n");
        let columns = project(Some(&row), &known_columns());
        let keys: Vec<&str> = columns.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["id", "name", "domain", "url", "extra", "operation"]);
    }

    #[test]
    fn projection_is_idempotent() {
        let row = sample().with("new column(1)", "x");
        let first = project(Some(&row), &known_columns());
        let second = project(Some(&row), &known_columns());
        assert_eq!(first, second);
    }

    #[test]
    fn rename_of_image_column_keeps_marker() {
        let known = known_columns();
        let row = Row::new().with("id", 1).with("photo(img)", "");
        let columns = project(Some(&row), &known);
        let photo = columns
            .iter()
            .find(|c| c.key == "photo(img)")
            .expect("photo column should be projected");

        let rename = rename_request(photo, "avatar", &known).expect("rename should be issued");
        assert_eq!(
            rename,
            ColumnRename {
                old_name: "photo(img)".to_string(),
                new_name: "avatar(img)".to_string(),
            }
        );

        let renamed_row = Row::new().with("id", 1).with(rename.new_name.as_str(), "");
        let renamed = project(Some(&renamed_row), &known);
        let avatar = renamed
            .iter()
            .find(|c| c.title == "avatar")
            .expect("renamed column should be projected");
        assert_eq!(avatar.kind, ColumnKind::ImageUrl);
    }

    #[test]
    fn rename_is_refused_for_fixed_columns_and_blank_titles() {
        let known = known_columns();
        let columns = project(Some(&sample()), &known);
        assert!(rename_request(&columns[0], "key", &known).is_none());
        assert!(rename_request(&columns[1], "label", &known).is_none());
        assert!(rename_request(&columns[4], "   ", &known).is_none());
        assert!(rename_request(&columns[4], "logo", &known).is_none());
    }

    #[test]
    fn new_column_names_are_numbered() {
        assert_eq!(new_column_name(3), "new column(3)");
        assert_eq!(
            NewColumnKind::Image.raw_name(&new_column_name(3)),
            "new column(3)(img)"
        );
        assert_eq!(NewColumnKind::Date.raw_name(&new_column_name(4)), "new column(4)");
    }
}
