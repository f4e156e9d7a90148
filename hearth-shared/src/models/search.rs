/// Query-building helpers shared by the list endpoints
///
/// Every list query is assembled twice, once for `COUNT(*)` and once for the
/// page of rows, so filters are written as functions that push onto a
/// [`QueryBuilder`] whose base statement already ends in `WHERE TRUE`.

use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};

/// Search and category filter used by the content libraries
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentFilter {
    /// Case-insensitive substring matched against title, author and description
    pub search: Option<String>,

    /// Exact (case-insensitive) category
    pub category: Option<String>,
}

/// Escapes `LIKE` wildcards and wraps the term in `%…%`
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Returns the trimmed value, or None when it is blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Appends `AND (col1 ILIKE $n OR col2 ILIKE $n ...)` for a non-blank term
pub fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&str], term: Option<&str>) {
    let Some(term) = term else {
        return;
    };

    let pattern = like_pattern(term);
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column)
            .push(" ILIKE ")
            .push_bind(pattern.clone());
    }
    qb.push(")");
}

/// Appends `AND LOWER(column) = LOWER($n)` for a non-blank value
pub fn push_equals_ignore_case(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    value: Option<&str>,
) {
    if let Some(value) = value {
        qb.push(" AND LOWER(")
            .push(column)
            .push(") = LOWER(")
            .push_bind(value.to_string())
            .push(")");
    }
}

/// Content-library filter: search over title/author/description plus category
pub fn push_content_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ContentFilter) {
    push_search(
        qb,
        &["title", "author", "description"],
        non_blank(&filter.search),
    );
    push_equals_ignore_case(qb, "category", non_blank(&filter.category));
}

/// Appends `LIMIT`/`OFFSET` binds
pub fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: &crate::pagination::PageRequest) {
    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}
