//! Client-side pagination state for server-paginated lists.

use serde::Serialize;

/// Position within a server-paginated list. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            total_pages: 1,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, total_pages: u32) -> Self {
        Self {
            page: page.max(1),
            total_pages,
        }
    }

    /// "previous" is disabled on the first page.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// "next" is disabled once the backend-reported last page is reached.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Target page for "previous", or `None` when navigation is disabled.
    pub fn previous(&self) -> Option<u32> {
        self.has_previous().then(|| self.page - 1)
    }

    /// Target page for "next", or `None` when navigation is disabled.
    pub fn next(&self) -> Option<u32> {
        self.has_next().then(|| self.page + 1)
    }

    pub fn label(&self) -> String {
        format!("Página {} de {}", self.page, self.total_pages)
    }

    pub fn view(&self) -> PaginationView {
        PaginationView {
            page: self.page,
            total_pages: self.total_pages,
            previous_disabled: !self.has_previous(),
            next_disabled: !self.has_next(),
            label: self.label(),
        }
    }
}

/// Rendered pagination controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub page: u32,
    pub total_pages: u32,
    pub previous_disabled: bool,
    pub next_disabled: bool,
    pub label: String,
}
