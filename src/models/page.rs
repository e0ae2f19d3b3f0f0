//! Paginated result container.

use serde::{Deserialize, Serialize};

/// One page of results plus the totals needed to navigate the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index
    pub number: u32,
    /// Requested page size
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number_of_elements: u32,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, number: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements
                .div_ceil(u64::from(size))
                .min(u64::from(u32::MAX)) as u32
        };

        Self {
            number_of_elements: content.len() as u32,
            empty: content.is_empty(),
            first: number == 0,
            last: u64::from(number) + 1 >= u64::from(total_pages),
            content,
            number,
            size,
            total_elements,
            total_pages,
        }
    }

    /// Transform the page content, keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
