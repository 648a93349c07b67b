/// Field the match-all pattern is applied to when the grid has no filter.
pub const DEFAULT_FILTER_FIELD: &str = "domain";
pub const DEFAULT_SORT_FIELD: &str = "id";
pub const MATCH_ALL_PATTERN: &str = "%";
/// Escape character for `%`, `_` and itself inside `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeFilter {
    pub field: String,
    pub pattern: String,
}

impl LikeFilter {
    pub fn match_all() -> Self {
        Self {
            field: DEFAULT_FILTER_FIELD.to_string(),
            pattern: MATCH_ALL_PATTERN.to_string(),
        }
    }

    pub fn is_match_all(&self) -> bool {
        self.pattern == MATCH_ALL_PATTERN
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub table: String,
    pub order_by: OrderBy,
    pub filter: LikeFilter,
    pub offset: u64,
    pub limit: u64,
}

impl QueryDescriptor {
    /// Inclusive `[first, last]` row window.
    pub fn range(&self) -> (u64, u64) {
        (self.offset, self.offset + self.limit.saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountDescriptor {
    pub table: String,
    pub filter: LikeFilter,
}
