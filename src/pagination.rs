//! Pure pagination math over an in-memory result list.

/// One entry of the page-number rail. Ellipsis entries are non-interactive
/// placeholders between page windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEntry {
    Number(usize),
    Ellipsis,
}

/// Full page rails are emitted up to this many pages; longer rails are
/// compressed with ellipses.
const MAX_PAGES_TO_SHOW: usize = 5;

/// Fixed-size pager over an ordered list. Pages are 1-indexed.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        debug_assert!(page_size > 0);
        Self { page_size }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages needed for `item_count` items; 0 when the list is empty.
    pub fn total_pages(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.page_size)
    }

    /// The slice of `items` shown on page `page`, clipped to bounds.
    /// Out-of-range pages yield an empty slice.
    pub fn page_slice<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        if page == 0 {
            return &[];
        }
        let start = (page - 1) * self.page_size;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    /// Compressed page-number rail for the pagination control.
    ///
    /// Five or fewer pages are listed in full. Longer rails show a window
    /// around the current page with ellipsis placeholders:
    /// near the start `1 2 3 4 ... N`, near the end `1 ... N-3 N-2 N-1 N`,
    /// otherwise `1 ... p-1 p p+1 ... N`.
    pub fn page_numbers(&self, current_page: usize, total_pages: usize) -> Vec<PageEntry> {
        let mut pages = Vec::new();

        if total_pages <= MAX_PAGES_TO_SHOW {
            for i in 1..=total_pages {
                pages.push(PageEntry::Number(i));
            }
        } else if current_page <= 3 {
            for i in 1..=4 {
                pages.push(PageEntry::Number(i));
            }
            pages.push(PageEntry::Ellipsis);
            pages.push(PageEntry::Number(total_pages));
        } else if current_page >= total_pages - 2 {
            pages.push(PageEntry::Number(1));
            pages.push(PageEntry::Ellipsis);
            for i in (total_pages - 3)..=total_pages {
                pages.push(PageEntry::Number(i));
            }
        } else {
            pages.push(PageEntry::Number(1));
            pages.push(PageEntry::Ellipsis);
            pages.push(PageEntry::Number(current_page - 1));
            pages.push(PageEntry::Number(current_page));
            pages.push(PageEntry::Number(current_page + 1));
            pages.push(PageEntry::Ellipsis);
            pages.push(PageEntry::Number(total_pages));
        }

        pages
    }

    /// Validates a page-change request for a list of `item_count` items.
    ///
    /// Returns the accepted page when it is in `[1, total_pages]`, `None`
    /// for out-of-range requests (a silent no-op for callers). Accepting a
    /// change implies the view should scroll back to the top.
    pub fn change_page(&self, requested: usize, item_count: usize) -> Option<usize> {
        let total = self.total_pages(item_count);
        if requested >= 1 && requested <= total {
            Some(requested)
        } else {
            None
        }
    }
}
