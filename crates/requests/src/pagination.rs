use serde::Serialize;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// One slice of a fully materialised result set
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PageInfo,
}

/// Offset/limit slice over `items`.
///
/// `page` is 1-based and clamped to at least 1; `limit` is clamped to `1..=MAX_LIMIT`.
/// A page past the end is empty, not an error.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_LIMIT);
    let total = items.len();

    let data = items
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        data,
        pagination: PageInfo {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit),
        },
    }
}
