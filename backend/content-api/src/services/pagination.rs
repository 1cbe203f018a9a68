//! Fixed-size feed pagination

/// Posts returned per feed page.
pub const POSTS_PER_PAGE: i64 = 2;

/// Offset window for one feed page, plus the index of the last
/// non-empty page for the current total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: i64,
    pub limit: i64,
    pub last_page: i64,
}

/// Compute the window for `page` over `total_count` items. Page numbers
/// start at 1; anything below is clamped up. Pages past the end yield an
/// empty window rather than an error, including pages large enough to
/// overflow the offset arithmetic.
pub fn page_window(total_count: i64, page_size: i64, page: i64) -> PageWindow {
    let page = page.max(1);
    PageWindow {
        skip: (page - 1).saturating_mul(page_size),
        limit: page_size,
        last_page: (total_count + page_size - 1) / page_size,
    }
}
