use serde::Serialize;

use crate::api::QueryParams;
use crate::domain::types::TypeConstraintError;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

/// Position in a collection without a known total: a page size and the
/// offset of the first item on the current page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    page_size: usize,
    offset: usize,
}

impl PageCursor {
    pub fn new(page_size: usize) -> Result<Self, TypeConstraintError> {
        if page_size == 0 {
            return Err(TypeConstraintError::ZeroPageSize);
        }
        Ok(Self {
            page_size,
            offset: 0,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Zero-based index of the current page.
    pub fn page_index(&self) -> usize {
        self.offset / self.page_size
    }

    /// One-based page number shown to the user.
    pub fn page_number(&self) -> usize {
        self.page_index() + 1
    }

    pub fn is_first_page(&self) -> bool {
        self.offset == 0
    }

    pub fn advance(&mut self) {
        self.offset += self.page_size;
    }

    /// Moves one page back; returns `false` on the first page.
    pub fn step_back(&mut self) -> bool {
        if self.offset == 0 {
            return false;
        }
        self.offset = self.offset.saturating_sub(self.page_size);
        true
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_ITEMS_PER_PAGE,
            offset: 0,
        }
    }
}

/// Free-text filter plus the page being shown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchFilter {
    pub text: String,
    pub cursor: PageCursor,
}

impl SearchFilter {
    pub fn new(cursor: PageCursor) -> Self {
        Self {
            text: String::new(),
            cursor,
        }
    }

    /// `{count, skip, query}`; `skip` is the page index and is omitted on the
    /// first page, `query` is omitted when empty.
    pub fn to_query(&self) -> QueryParams {
        self.query_at(self.cursor)
    }

    /// The query for this filter's text on another page.
    pub fn query_at(&self, cursor: PageCursor) -> QueryParams {
        QueryParams::new()
            .param("count", cursor.page_size())
            .param_if(!cursor.is_first_page(), "skip", cursor.page_index())
            .param("query", &self.text)
    }

    /// Whether a page of `len` items leaves room for a following page.
    pub fn page_is_full(&self, len: usize) -> bool {
        len >= self.cursor.page_size()
    }
}
