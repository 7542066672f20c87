//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};

/// Query parameters accepted by list and show requests
///
/// Numeric parameters are kept as strings so that a malformed value falls
/// back to its default instead of rejecting the request.
///
/// # Example
/// ```text
/// GET /company_tests?page=2&per_page=50
/// GET /company_tests?q=status:open -owner:U1 quarterly&sort=-name,id
/// GET /company_tests/t-1?include=owner.user,tags&relationships=true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    pub page: Option<String>,

    /// Number of records per page
    pub per_page: Option<String>,

    /// Filter expression, see [`crate::core::expression`]
    pub q: Option<String>,

    /// Comma-separated sort keys, `-` prefix for descending
    pub sort: Option<String>,

    /// Comma-separated dotted include paths
    pub include: Option<String>,

    /// Ask the serializer to emit related records
    pub relationships: Option<String>,
}

impl QueryParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Get page size, clamped into `1..=max`
    ///
    /// Missing or non-numeric values use `default`.
    pub fn per_page(&self, default: usize, max: usize) -> usize {
        let max = max.max(1);
        self.per_page
            .as_deref()
            .and_then(|p| p.trim().parse::<usize>().ok())
            .unwrap_or(default)
            .clamp(1, max)
    }

    /// Whether related records were requested
    pub fn relationships(&self) -> bool {
        match self.relationships.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of records per page
    pub per_page: usize,

    /// Total number of records (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, per_page: usize, total: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(per_page) };
        let start = (page - 1).saturating_mul(per_page);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: start.saturating_add(per_page) < total,
            has_prev: page > 1,
        }
    }
}
