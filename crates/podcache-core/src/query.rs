//! Read-side operations over a snapshot: pagination and substring search.
//!
//! Everything here is a pure function of its inputs. Callers obtain the
//! snapshot from the cache first; nothing in this module touches the cache or
//! the upstream source.

use serde::Serialize;

use crate::error::QueryError;
use crate::model::InventoryItem;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

/// Normalized pagination input.
///
/// Both values are always positive; anything else falls back to the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            limit: positive_or(limit, DEFAULT_LIMIT),
        }
    }

    /// Build from raw query-string values. Missing, unparsable and
    /// non-positive values clamp to the defaults.
    pub fn from_params(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page, DEFAULT_PAGE),
            limit: parse_positive(limit, DEFAULT_LIMIT),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

fn positive_or(value: i64, default: usize) -> usize {
    if value < 1 {
        return default;
    }
    usize::try_from(value).unwrap_or(default)
}

fn parse_positive(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .map(|v| positive_or(v, default))
        .unwrap_or(default)
}

/// One page of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<'a> {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub items: &'a [InventoryItem],
}

/// Slice `items` to the half-open range `[(page-1)*limit, page*limit)`,
/// clamped to the snapshot bounds. Out-of-range pages are empty.
pub fn paginate(items: &[InventoryItem], request: PageRequest) -> Page<'_> {
    let total = items.len();
    let start = (request.page - 1).saturating_mul(request.limit).min(total);
    let end = start.saturating_add(request.limit).min(total);

    Page {
        page: request.page,
        limit: request.limit,
        total,
        items: &items[start..end],
    }
}

/// A validated, lowercased search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn parse(raw: Option<&str>) -> Result<Self, QueryError> {
        let needle = raw.map(str::to_lowercase).unwrap_or_default();
        if needle.is_empty() {
            return Err(QueryError::missing("q"));
        }
        Ok(Self { needle })
    }

    pub fn as_str(&self) -> &str {
        &self.needle
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult<'a> {
    pub query: String,
    pub results: Vec<&'a InventoryItem>,
    pub count: usize,
}

/// All items whose name, namespace or status contains the query, in
/// snapshot order.
pub fn search<'a>(items: &'a [InventoryItem], query: &SearchQuery) -> SearchResult<'a> {
    let results: Vec<&InventoryItem> = items
        .iter()
        .filter(|item| item.matches(query.as_str()))
        .collect();

    SearchResult {
        query: query.as_str().to_string(),
        count: results.len(),
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<InventoryItem> {
        (0..n)
            .map(|i| InventoryItem::new(format!("pod-{i}"), "default", "Running"))
            .collect()
    }

    fn sample() -> Vec<InventoryItem> {
        vec![
            InventoryItem::new("web-1", "prod", "Running"),
            InventoryItem::new("db-1", "prod", "Pending"),
        ]
    }

    #[test]
    fn first_page_is_full() {
        let data = items(25);
        let page = paginate(&data, PageRequest::new(1, 10));
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].name, "pod-0");
        assert_eq!(page.total, 25);
    }

    #[test]
    fn last_page_is_partial() {
        let data = items(25);
        let page = paginate(&data, PageRequest::new(3, 10));
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].name, "pod-20");
        assert_eq!(page.items[4].name, "pod-24");
    }

    #[test]
    fn page_past_the_end_is_empty_with_total() {
        let data = items(25);
        let page = paginate(&data, PageRequest::new(4, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 25);
        assert_eq!(page.page, 4);
    }

    #[test]
    fn zero_values_clamp_to_defaults() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), 10);

        let request = PageRequest::new(-3, -1);
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn unparsable_params_clamp_to_defaults() {
        let request = PageRequest::from_params(Some("abc"), Some("1.5"));
        assert_eq!(request, PageRequest::default());

        let request = PageRequest::from_params(None, None);
        assert_eq!(request, PageRequest::default());

        let request = PageRequest::from_params(Some("2"), Some("5"));
        assert_eq!(request.page(), 2);
        assert_eq!(request.limit(), 5);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let data = items(3);
        let page = paginate(&data, PageRequest::new(i64::MAX, i64::MAX));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn empty_snapshot_paginates_to_nothing() {
        let page = paginate(&[], PageRequest::default());
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn search_matches_status_case_insensitively() {
        let data = sample();
        let query = SearchQuery::parse(Some("run")).unwrap();
        let result = search(&data, &query);
        assert_eq!(result.count, 1);
        assert_eq!(result.results[0].name, "web-1");
    }

    #[test]
    fn search_matches_namespace() {
        let data = sample();
        let query = SearchQuery::parse(Some("prod")).unwrap();
        let result = search(&data, &query);
        assert_eq!(result.count, 2);
        assert_eq!(result.results[0].name, "web-1");
        assert_eq!(result.results[1].name, "db-1");
    }

    #[test]
    fn search_echoes_lowercased_query() {
        let data = sample();
        let query = SearchQuery::parse(Some("DB")).unwrap();
        let result = search(&data, &query);
        assert_eq!(result.query, "db");
        assert_eq!(result.count, 1);
    }

    #[test]
    fn empty_or_missing_query_is_rejected() {
        assert_eq!(SearchQuery::parse(Some("")), Err(QueryError::missing("q")));
        assert_eq!(SearchQuery::parse(None), Err(QueryError::missing("q")));
    }

    #[test]
    fn no_match_yields_empty_results() {
        let data = sample();
        let query = SearchQuery::parse(Some("staging")).unwrap();
        let result = search(&data, &query);
        assert_eq!(result.count, 0);
        assert!(result.results.is_empty());
    }

    #[test]
    fn repeated_reads_are_identical() {
        let data = items(25);
        let request = PageRequest::new(2, 7);
        assert_eq!(paginate(&data, request), paginate(&data, request));

        let query = SearchQuery::parse(Some("pod-1")).unwrap();
        assert_eq!(search(&data, &query), search(&data, &query));
    }
}
