//! List queries: pagination, sorting, search and filters for entity lists

use crate::error::CleanErpError;
use cleanerp_common::{to_snake_case, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CleanErpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(CleanErpError::validation(format!(
                "Invalid sort direction: {s}"
            ))),
        }
    }
}

/// Column and direction to order a list by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column name, camelCase or snake_case
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub fn new(column: &str, direction: SortDirection) -> Self {
        Self {
            column: column.to_string(),
            direction,
        }
    }

    /// Column name as stored
    #[must_use]
    pub fn db_column(&self) -> String {
        to_snake_case(&self.column)
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.direction.as_sql().to_lowercase())
    }
}

/// Parses `column` or `column:asc|desc`
impl FromStr for SortSpec {
    type Err = CleanErpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match s.split_once(':') {
            Some((column, direction)) => (column.trim(), direction.parse()?),
            None => (s.trim(), SortDirection::Asc),
        };
        if column.is_empty() {
            return Err(CleanErpError::validation("Sort column cannot be empty"));
        }
        Ok(Self::new(column, direction))
    }
}

/// Parameters of one page of an entity list.
///
/// Pages are 1-based. Column names in `sort` and `filters` are checked
/// against the entity's whitelist when the query runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub sort: Option<SortSpec>,
    /// Equality filters as `(column, value)` pairs
    pub filters: Vec<(String, String)>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            sort: None,
            filters: Vec::new(),
        }
    }
}

impl ListQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a page, clamped to at least 1
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = if page == 0 { 1 } else { page };
        self
    }

    /// Set the page size, clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Free-text search; blank input clears it
    #[must_use]
    pub fn search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    #[must_use]
    pub fn sort_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec::new(column, direction));
        self
    }

    #[must_use]
    pub fn filter(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    /// Effective page size after clamping
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows skipped before this page
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit())
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Rows matching the query across all pages
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        Self {
            items,
            total,
            page: query.page.max(1),
            page_size: query.limit(),
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Transform the items, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::new();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 25);
        assert_eq!(query.offset(), 0);
        assert!(query.search.is_none());
        assert!(query.sort.is_none());
    }

    #[test]
    fn test_list_query_builder() {
        let query = ListQuery::new()
            .page(3)
            .page_size(10)
            .search("  acme ")
            .sort_by("companyName", SortDirection::Desc)
            .filter("status", "active");
        assert_eq!(query.offset(), 20);
        assert_eq!(query.search.as_deref(), Some("acme"));
        assert_eq!(query.sort.as_ref().unwrap().db_column(), "company_name");
        assert_eq!(query.filters, vec![("status".to_string(), "active".to_string())]);
    }

    #[test]
    fn test_list_query_clamps() {
        let query = ListQuery::new().page(0).page_size(500);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 100);

        let query = ListQuery::new().page_size(0);
        assert_eq!(query.page_size, 1);
        assert!(ListQuery::new().search("   ").search.is_none());
    }

    #[test]
    fn test_sort_spec_parse() {
        let spec: SortSpec = "contract_value:desc".parse().unwrap();
        assert_eq!(spec.column, "contract_value");
        assert_eq!(spec.direction, SortDirection::Desc);

        let spec: SortSpec = "siteName".parse().unwrap();
        assert_eq!(spec.direction, SortDirection::Asc);
        assert_eq!(spec.to_string(), "siteName:asc");

        assert!("name:sideways".parse::<SortSpec>().is_err());
        assert!(":desc".parse::<SortSpec>().is_err());
    }

    #[test]
    fn test_page_navigation() {
        let query = ListQuery::new().page(2).page_size(10);
        let page = Page::new(vec![1, 2, 3], 23, &query);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last = Page::new(vec![1, 2, 3], 23, &ListQuery::new().page(3).page_size(10));
        assert!(!last.has_next());

        let empty: Page<i32> = Page::new(Vec::new(), 0, &ListQuery::new());
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2], 2, &ListQuery::new());
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.total, 2);
    }
}
