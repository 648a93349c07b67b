//! Page state to remote query translation.

use crate::domain::entities::page::{PageState, SortDirection};
use crate::domain::entities::query::{
    CountDescriptor, LikeFilter, OrderBy, QueryDescriptor, DEFAULT_SORT_FIELD, LIKE_ESCAPE,
};

pub fn to_query_descriptor(table: &str, page_state: &PageState) -> QueryDescriptor {
    let page_size = page_state.page_size.max(1);
    let offset = page_state.current_page.saturating_sub(1) * page_size;

    QueryDescriptor {
        table: table.to_string(),
        order_by: order_by(page_state),
        filter: like_filter(page_state),
        offset,
        limit: page_size,
    }
}

/// Same filter as the page query, without ordering or windowing.
pub fn to_count_descriptor(table: &str, page_state: &PageState) -> CountDescriptor {
    CountDescriptor {
        table: table.to_string(),
        filter: like_filter(page_state),
    }
}

fn order_by(page_state: &PageState) -> OrderBy {
    match &page_state.sort {
        Some(sort) if !sort.field.trim().is_empty() => OrderBy {
            field: sort.field.clone(),
            ascending: sort.direction != SortDirection::Descending,
        },
        _ => OrderBy {
            field: DEFAULT_SORT_FIELD.to_string(),
            ascending: true,
        },
    }
}

fn like_filter(page_state: &PageState) -> LikeFilter {
    match &page_state.filter {
        Some(filter) if !filter.field.trim().is_empty() && !filter.term.trim().is_empty() => {
            LikeFilter {
                field: filter.field.clone(),
                pattern: format!("%{}%", escape_like(&filter.term)),
            }
        }
        _ => LikeFilter::match_all(),
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::page::SortSpec;

    #[test]
    fn offset_and_window_follow_page_and_size() {
        for (page, size) in [(1_u64, 10_u64), (2, 10), (3, 20), (7, 100)] {
            let query = to_query_descriptor("companies", &PageState::default().with_page(page, size));
            assert_eq!(query.offset, (page - 1) * size);
            let (first, last) = query.range();
            assert_eq!(last - first + 1, size, "window size for page {page}");
        }
    }

    #[test]
    fn no_filter_becomes_match_all_on_domain() {
        let query = to_query_descriptor("companies", &PageState::default());
        assert_eq!(query.filter.field, "domain");
        assert_eq!(query.filter.pattern, "%");
        assert!(query.filter.is_match_all());
    }

    #[test]
    fn filter_becomes_substring_pattern() {
        let state = PageState::default().with_filter("domain", "ac");
        let query = to_query_descriptor("companies", &state);
        assert_eq!(query.filter.field, "domain");
        assert_eq!(query.filter.pattern, "%ac%");
    }

    #[test]
    fn blank_filter_term_counts_as_no_filter() {
        let state = PageState::default().with_filter("name", "  ");
        assert!(to_query_descriptor("companies", &state).filter.is_match_all());
    }

    #[test]
    fn wildcards_in_term_are_escaped() {
        let state = PageState::default().with_filter("name", "50%_off\\");
        let query = to_query_descriptor("companies", &state);
        assert_eq!(query.filter.pattern, "%50\\%\\_off\\\\%");
    }

    #[test]
    fn descending_only_when_requested() {
        let desc = PageState::default().with_sort("name", SortDirection::Descending);
        let query = to_query_descriptor("companies", &desc);
        assert_eq!(query.order_by.field, "name");
        assert!(!query.order_by.ascending);

        let asc = PageState::default().with_sort("name", SortDirection::parse("whatever"));
        assert!(to_query_descriptor("companies", &asc).order_by.ascending);
    }

    #[test]
    fn missing_sort_defaults_to_id_ascending() {
        let mut state = PageState::default();
        state.sort = None;
        let query = to_query_descriptor("companies", &state);
        assert_eq!(query.order_by.field, "id");
        assert!(query.order_by.ascending);

        state.sort = Some(SortSpec {
            field: String::new(),
            direction: SortDirection::Descending,
        });
        let query = to_query_descriptor("companies", &state);
        assert_eq!(query.order_by.field, "id");
        assert!(query.order_by.ascending);
    }

    #[test]
    fn count_descriptor_shares_filter() {
        let state = PageState::default().with_page(3, 20).with_filter("name", "ac");
        let count = to_count_descriptor("companies", &state);
        assert_eq!(count.table, "companies");
        assert_eq!(count.filter, to_query_descriptor("companies", &state).filter);
    }
}
