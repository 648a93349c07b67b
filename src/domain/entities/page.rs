pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const PAGE_SIZE_OPTIONS: [u64; 3] = [10, 20, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Only an explicit descending token sorts descending; anything else,
    /// including an empty string, is ascending.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "descend" | "descending" | "desc" => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub field: String,
    pub term: String,
}

/// Paging, sorting and filtering intent of the grid.
///
/// Replaced wholesale on every interaction; the `with_*` builders return a
/// fresh value instead of mutating the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub current_page: u64,
    pub page_size: u64,
    pub sort: Option<SortSpec>,
    pub filter: Option<ColumnFilter>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: Some(SortSpec {
                field: "id".to_string(),
                direction: SortDirection::Ascending,
            }),
            filter: None,
        }
    }
}

impl PageState {
    pub fn with_page(&self, current_page: u64, page_size: u64) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size: page_size.max(1),
            ..self.clone()
        }
    }

    pub fn with_sort(&self, field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            sort: Some(SortSpec {
                field: field.into(),
                direction,
            }),
            ..self.clone()
        }
    }

    /// Searching restarts from the first page.
    pub fn with_filter(&self, field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            current_page: 1,
            filter: Some(ColumnFilter {
                field: field.into(),
                term: term.into(),
            }),
            ..self.clone()
        }
    }

    pub fn without_filter(&self) -> Self {
        Self {
            current_page: 1,
            filter: None,
            ..self.clone()
        }
    }

    pub fn sort_direction_for(&self, field: &str) -> Option<SortDirection> {
        self.sort
            .as_ref()
            .filter(|sort| sort.field == field)
            .map(|sort| sort.direction)
    }

    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size.max(1)).max(1)
    }
}
