use crate::error::{CatalogError, Result};
use crate::types::Entity;

/// Fixed-size paging over a projection. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
}

/// One visible page: the items plus where they sit in the projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow<'a> {
    pub items: &'a [Entity],
    pub current_page: usize,
    pub total_pages: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub total_items: usize,
}

impl PageWindow<'_> {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(CatalogError::InvalidArgument("page size must be greater than zero".into()));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size)
    }

    /// Out-of-range pages clamp to the nearest valid page; an empty
    /// projection still reports page 1.
    pub fn clamp_page(&self, page: usize, total_items: usize) -> usize {
        page.clamp(1, self.total_pages(total_items).max(1))
    }

    /// Paging controls are only worth showing past a single page
    pub fn needs_controls(&self, total_items: usize) -> bool {
        total_items > self.page_size
    }

    pub fn window<'a>(&self, projection: &'a [Entity], page: usize) -> PageWindow<'a> {
        let total_items = projection.len();
        let current_page = self.clamp_page(page, total_items);
        let start_index = ((current_page - 1) * self.page_size).min(total_items);
        let end_index = (start_index + self.page_size).min(total_items);
        PageWindow {
            items: &projection[start_index..end_index],
            current_page,
            total_pages: self.total_pages(total_items),
            start_index,
            end_index,
            total_items,
        }
    }
}

/// Everything loaded and matching, growing as the cache grows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeWindow<'a> {
    pub items: &'a [Entity],
    pub total_loaded: usize,
    pub has_more: bool,
}

impl<'a> CumulativeWindow<'a> {
    pub fn new(projection: &'a [Entity], total_loaded: usize, has_more: bool) -> Self {
        Self {
            items: projection,
            total_loaded,
            has_more,
        }
    }

    /// Items not yet consumed once the consumer has seen `consumed` of them
    pub fn remaining(&self, consumed: usize) -> usize {
        self.items.len().saturating_sub(consumed)
    }
}
