//! Paging primitives.
//!
//! Pages are 0-based. Asking for a page past the end yields empty content
//! with the real total, never an error. Ordering always comes from the
//! upstream sequence; nothing here re-sorts.

use serde::Serialize;

use crate::core::{CoreError, CoreResult};

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    index: usize,
    size: usize,
}

impl PageRequest {
    /// Build a page request. Fails with `InvalidArgument` when `size` is 0.
    pub fn new(index: usize, size: usize) -> CoreResult<Self> {
        if size == 0 {
            return Err(CoreError::invalid("page size must be a positive integer"));
        }
        Ok(Self { index, size })
    }

    /// First page at the default size.
    #[must_use]
    pub const fn first() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of elements to skip, saturating at `usize::MAX`.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.index.saturating_mul(self.size)
    }

    #[must_use]
    pub const fn next(&self) -> Self {
        Self {
            index: self.index.saturating_add(1),
            size: self.size,
        }
    }

    /// LIMIT/OFFSET pair for SQL, clamped to `i64::MAX`.
    pub(crate) fn sql_bounds(&self) -> (i64, i64) {
        let limit = i64::try_from(self.size).unwrap_or(i64::MAX);
        let offset = i64::try_from(self.offset()).unwrap_or(i64::MAX);
        (limit, offset)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub page_index: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub(crate) const fn new(content: Vec<T>, total_elements: u64, request: PageRequest) -> Self {
        Self {
            content,
            total_elements,
            page_index: request.index,
            page_size: request.size,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(self.page_size as u64)
    }

    /// Whether another non-empty page follows this one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        (self.page_index as u64).saturating_add(1) < self.total_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_index: self.page_index,
            page_size: self.page_size,
        }
    }
}

/// Cut one page out of an already-ordered in-memory sequence.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let content = items
        .into_iter()
        .skip(request.offset())
        .take(request.size)
        .collect();
    Page::new(content, total, request)
}
