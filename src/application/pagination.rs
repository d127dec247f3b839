//! Page-number pagination shared by the news list and the shop catalog.

use serde::{Deserialize, Serialize};

/// One page of items plus the numbers needed to render pager links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> u32 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_number(&self) -> u32 {
        (self.number + 1).min(self.num_pages)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

/// Parse a raw `page` query value; anything unusable is page 1.
pub fn parse_page_number(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|number| *number >= 1)
        .unwrap_or(1)
}

/// Page window over `total` items. Requests past the end land on the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub offset: usize,
    pub limit: usize,
}

impl PageWindow {
    pub fn new(total: u64, requested: u32, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let num_pages = total.div_ceil(per_page as u64).max(1);
        let num_pages = u32::try_from(num_pages).unwrap_or(u32::MAX);
        let number = requested.clamp(1, num_pages);
        Self {
            number,
            num_pages,
            offset: (number as usize - 1) * per_page,
            limit: per_page,
        }
    }

    /// Slice `items` (the full ordered result) down to this window.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }

    pub fn into_page<T>(self, items: Vec<T>, total: u64) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total,
        }
    }
}
