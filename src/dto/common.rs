use serde::Deserialize;
use utoipa::IntoParams;

/// Default page size when the query omits one.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Upper bound on client-requested page sizes.
pub const MAX_PAGE_SIZE: usize = 100;

/// Pagination and sorting query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<usize>,
    /// Items per page, capped at [`MAX_PAGE_SIZE`].
    pub page_size: Option<usize>,
    /// Sort criteria string, e.g. `avg_score:desc,sum_score:desc`.
    pub sort: Option<String>,
}

impl PageQuery {
    /// Effective 1-based page number.
    pub fn page(&self) -> usize {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page_size(&self) -> usize {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Slice `items` down to the requested page, returning the page and the total
/// item count before slicing.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> (Vec<T>, usize) {
    let total = items.len();
    let start = page.saturating_sub(1).saturating_mul(page_size);
    let page_items = items
        .into_iter()
        .skip(start)
        .take(page_size)
        .collect();
    (page_items, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_slices_and_reports_total() {
        let (page, total) = paginate((1..=7).collect::<Vec<_>>(), 2, 3);
        assert_eq!(page, vec![4, 5, 6]);
        assert_eq!(total, 7);
    }

    #[test]
    fn paginate_past_the_end_is_empty() {
        let (page, total) = paginate(vec![1, 2], 5, 10);
        assert!(page.is_empty());
        assert_eq!(total, 2);
    }

    #[test]
    fn page_query_clamps_inputs() {
        let query = PageQuery {
            page: Some(0),
            page_size: Some(10_000),
            sort: None,
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), MAX_PAGE_SIZE);
    }
}
