//! Page-number window for result navigation.

/// Pages shown on either side of the current page.
pub const DEFAULT_PAGE_DELTA: usize = 1;

/// One slot in a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    /// Zero-based page index.
    Page(usize),
    /// A collapsed run of skipped pages.
    Ellipsis,
}

/// Computes which page links to display.
///
/// The first and last pages are always present, as is every page within
/// `delta` of `current`. Each run of omitted pages collapses into a single
/// [`PageItem::Ellipsis`]. `current` may lie outside `0..total_pages`.
pub fn pagination_window(
    current: usize,
    total_pages: usize,
    delta: usize,
) -> Vec<PageItem> {
    let mut pages = Vec::new();

    for i in 0..total_pages {
        if i == 0 || i == total_pages - 1 || i.abs_diff(current) <= delta {
            pages.push(PageItem::Page(i));
        } else if pages.last() != Some(&PageItem::Ellipsis) {
            pages.push(PageItem::Ellipsis);
        }
    }

    pages
}
