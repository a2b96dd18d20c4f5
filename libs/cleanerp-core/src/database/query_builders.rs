//! SQL query builder utilities
//!
//! Column names are never taken from callers verbatim: list queries check
//! sort and filter columns against a [`TableSpec`] whitelist, and update
//! builders only accept `&'static str` column names. Values always go through
//! bind parameters.

use crate::error::{CleanErpError, Result};
use crate::models::StoredCode;
use crate::query::{ListQuery, SortDirection};
use cleanerp_common::to_snake_case;
use sqlx::sqlite::SqliteArguments;
use sqlx::{QueryBuilder, Sqlite};

/// Turns a caller's filter value into the form stored in the column
pub type FilterNormalizer = fn(&str) -> Result<String>;

/// Parse a filter value as `T` and return its stored code
///
/// # Errors
/// Returns the parse error of `T` for values that name no variant
pub fn stored_code<T: StoredCode>(value: &str) -> Result<String> {
    value.parse::<T>().map(|parsed| parsed.code().to_string())
}

/// Escape `LIKE` wildcards so a search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Static description of an entity table used to build list queries
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    /// Table name
    pub table: &'static str,
    /// Entity name used in error messages
    pub entity: &'static str,
    /// Columns a list may be ordered by
    pub sortable: &'static [&'static str],
    /// Columns matched by free-text search
    pub searchable: &'static [&'static str],
    /// Columns accepted in equality filters
    pub filterable: &'static [&'static str],
    /// Filter columns holding enum codes, with the parser for their values
    pub coded: &'static [(&'static str, FilterNormalizer)],
    /// Ordering when the query names none
    pub default_sort: (&'static str, SortDirection),
}

impl TableSpec {
    fn resolve(
        &self,
        column: &str,
        allowed: &'static [&'static str],
        purpose: &str,
    ) -> Result<&'static str> {
        let column = to_snake_case(column);
        allowed
            .iter()
            .copied()
            .find(|c| *c == column)
            .ok_or_else(|| {
                CleanErpError::validation(format!(
                    "Cannot {purpose} {} by '{column}'",
                    self.entity
                ))
            })
    }

    fn filter_value(&self, column: &str, value: &str) -> Result<String> {
        match self.coded.iter().find(|(coded, _)| *coded == column) {
            Some((_, normalize)) => normalize(value),
            None => Ok(value.to_string()),
        }
    }

    /// Check every column named by the query against the whitelists
    ///
    /// # Errors
    /// Returns `CleanErpError::Validation` naming the first unknown column,
    /// or the parse error of a filter value that is not a known code
    pub fn validate_query(&self, query: &ListQuery) -> Result<()> {
        if let Some(sort) = &query.sort {
            self.resolve(&sort.column, self.sortable, "sort")?;
        }
        for (column, value) in &query.filters {
            let column = self.resolve(column, self.filterable, "filter")?;
            self.filter_value(column, value)?;
        }
        Ok(())
    }

    fn push_where(&self, builder: &mut QueryBuilder<'_, Sqlite>, query: &ListQuery) -> Result<()> {
        let mut first = true;
        let mut next_clause = |builder: &mut QueryBuilder<'_, Sqlite>| {
            builder.push(if first { " WHERE " } else { " AND " });
            first = false;
        };

        for (column, value) in &query.filters {
            let column = self.resolve(column, self.filterable, "filter")?;
            let value = self.filter_value(column, value)?;
            next_clause(builder);
            builder.push(column).push(" = ").push_bind(value);
        }

        if let Some(term) = &query.search {
            if !self.searchable.is_empty() {
                next_clause(builder);
                let pattern = format!("%{}%", escape_like(term));
                builder.push("(");
                for (i, column) in self.searchable.iter().enumerate() {
                    if i > 0 {
                        builder.push(" OR ");
                    }
                    builder
                        .push(*column)
                        .push(" LIKE ")
                        .push_bind(pattern.clone())
                        .push(" ESCAPE '\\'");
                }
                builder.push(")");
            }
        }
        Ok(())
    }

    /// `SELECT * ... ORDER BY ... LIMIT ... OFFSET ...` for one page
    ///
    /// # Errors
    /// Returns `CleanErpError::Validation` for unknown sort or filter columns
    pub fn select_page(&self, query: &ListQuery) -> Result<QueryBuilder<'static, Sqlite>> {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {}", self.table));
        self.push_where(&mut builder, query)?;

        let (column, direction) = match &query.sort {
            Some(sort) => (
                self.resolve(&sort.column, self.sortable, "sort")?,
                sort.direction,
            ),
            None => self.default_sort,
        };
        builder
            .push(" ORDER BY ")
            .push(column)
            .push(" ")
            .push(direction.as_sql())
            .push(", id ASC LIMIT ")
            .push_bind(i64::from(query.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        Ok(builder)
    }

    /// `SELECT COUNT(*)` over the same filters as [`Self::select_page`]
    ///
    /// # Errors
    /// Returns `CleanErpError::Validation` for unknown filter columns
    pub fn count(&self, query: &ListQuery) -> Result<QueryBuilder<'static, Sqlite>> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", self.table));
        self.push_where(&mut builder, query)?;
        Ok(builder)
    }
}

/// A value bound into a dynamically built statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Null,
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Bind a [`SqlValue`] onto a query
pub fn bind_value<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Text(text) => query.bind(text),
        SqlValue::Real(real) => query.bind(real),
        SqlValue::Integer(integer) => query.bind(integer),
        SqlValue::Null => query.bind(Option::<String>::None),
    }
}

/// Builder for UPDATE statements
///
/// Fields are only added when a value is present, so an update request
/// touches just the columns it names. `updated_at` is always set.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table: &'static str,
    updates: Vec<(&'static str, SqlValue)>,
}

impl UpdateBuilder {
    /// Create a builder for `table`
    #[must_use]
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            updates: Vec::new(),
        }
    }

    /// Set `column` to `value`
    #[must_use]
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.updates.push((column, value.into()));
        self
    }

    /// Set `column` only when `value` is present
    #[must_use]
    pub fn set_if<T: Into<SqlValue>>(self, column: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.set(column, value),
            None => self,
        }
    }

    /// Check if any fields have been set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Get the number of fields being updated
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Get the column names being updated
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.updates.iter().map(|(column, _)| *column).collect()
    }

    /// Build the complete UPDATE query string
    ///
    /// Parameters are the field values in insertion order, then
    /// `updated_at`, then the row id.
    #[must_use]
    pub fn build_query_string(&self) -> String {
        let mut assignments: Vec<String> = self
            .updates
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect();
        assignments.push("updated_at = ?".to_string());
        format!(
            "UPDATE {} SET {} WHERE id = ?",
            self.table,
            assignments.join(", ")
        )
    }

    /// Field values in bind order
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.updates.into_iter().map(|(_, value)| value).collect()
    }
}
