//! Listing filters and paginated results.

use serde::Serialize;
use siraj_core::ProductStatus;

/// Which collection a listing reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listing {
    Products,
    Bundles,
}

impl Listing {
    /// Path segment under `/api`.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Bundles => "bundles",
        }
    }
}

/// Filters for `GET /api/{products|bundles}`.
///
/// Blank strings are treated as absent so form submissions with empty
/// fields do not narrow the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub page: u32,
    /// Page size; `None` uses the configured default.
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub featured: Option<bool>,
    pub exclude_id: Option<String>,
    pub status: Option<ProductStatus>,
}

impl ListQuery {
    /// First page with no filters.
    #[must_use]
    pub fn first_page() -> Self {
        Self {
            page: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = non_blank(category);
        self
    }

    #[must_use]
    pub fn search(mut self, search: Option<String>) -> Self {
        self.search = non_blank(search);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Option<String>) -> Self {
        self.sort = non_blank(sort);
        self
    }

    /// Requested page, never below 1.
    #[must_use]
    pub fn requested_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Query-string parameters in a stable order.
    #[must_use]
    pub fn params(&self, default_limit: u32) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.requested_page().to_string()),
            ("limit", self.effective_limit(default_limit).to_string()),
        ];
        let optional = [
            ("category", self.category.clone()),
            ("search", self.search.clone()),
            ("sort", self.sort.clone()),
            ("featured", self.featured.map(|f| f.to_string())),
            ("exclude_id", self.exclude_id.clone()),
            ("status", self.status.map(|s| s.as_str().to_string())),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| non_blank(value).map(|v| (key, v))),
        );
        params
    }

    /// Page size used for the request.
    #[must_use]
    pub fn effective_limit(&self, default_limit: u32) -> u32 {
        self.limit.unwrap_or(default_limit).max(1)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_pages: u32,
    pub current_page: u32,
}

impl<T> Page<T> {
    /// What a failed listing shows: nothing, on page 1 of 1.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_pages: 1,
            current_page: 1,
        }
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// `ceil((total or limit) / limit)`; a zero total counts as missing.
#[must_use]
pub fn total_pages(total: Option<u64>, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    let total = total.filter(|t| *t > 0).unwrap_or(limit);
    u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(Some(20), 12), 2);
        assert_eq!(total_pages(Some(24), 12), 2);
        assert_eq!(total_pages(Some(25), 12), 3);
        assert_eq!(total_pages(None, 12), 1);
        assert_eq!(total_pages(Some(0), 12), 1);
    }

    #[test]
    fn test_params_skip_blank_filters() {
        let query = ListQuery::first_page()
            .category(Some("  ".to_string()))
            .search(Some("vanilla".to_string()));
        assert_eq!(
            query.params(12),
            vec![
                ("page", "1".to_string()),
                ("limit", "12".to_string()),
                ("search", "vanilla".to_string()),
            ]
        );
    }

    #[test]
    fn test_params_related_products() {
        let query = ListQuery {
            exclude_id: Some("p1".to_string()),
            status: Some(ProductStatus::Active),
            ..ListQuery::first_page().limit(4).category(Some("Candles".to_string()))
        };
        let params = query.params(12);
        assert!(params.contains(&("limit", "4".to_string())));
        assert!(params.contains(&("exclude_id", "p1".to_string())));
        assert!(params.contains(&("status", "Active".to_string())));
        assert!(params.contains(&("category", "Candles".to_string())));
    }

    #[test]
    fn test_page_zero_requests_first_page() {
        assert_eq!(ListQuery::default().requested_page(), 1);
    }

    #[test]
    fn test_empty_page() {
        let page: Page<()> = Page::empty();
        assert_eq!((page.total_pages, page.current_page), (1, 1));
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }
}
