//! Keyset pagination for listings.
//!
//! Product and order listings are scrolled page by page. Offsets drift when
//! rows are inserted between requests, so pages are keyed by the last ID seen
//! instead: each page asks for rows strictly "after" a cursor, which means an
//! ID never shows up on two pages.

use serde::{Deserialize, Serialize};

/// Default page size when a client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 24;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Cursor and size of a requested page, usually taken from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PageRequest {
    /// Return rows that sort after this cursor.
    #[serde(default)]
    pub after: Option<i32>,
    /// Requested page size.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageRequest {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of rows to fetch: one more than the page size, so the caller
    /// can tell whether another page exists.
    #[must_use]
    pub fn fetch_limit(&self) -> i64 {
        i64::from(self.limit()) + 1
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following page, `None` on the last page.
    pub next_cursor: Option<i32>,
}

impl<T> Page<T> {
    /// Build a page from rows fetched with [`PageRequest::fetch_limit`].
    ///
    /// `cursor_of` extracts the sort key of a row.
    #[must_use]
    pub fn from_overfetch(mut rows: Vec<T>, request: &PageRequest, cursor_of: impl Fn(&T) -> i32) -> Self {
        let limit = request.limit() as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(cursor_of)
        } else {
            None
        };
        Self {
            items: rows,
            next_cursor,
        }
    }

    /// Transform each item, keeping the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(PageRequest::default().limit(), DEFAULT_PAGE_SIZE);
        let zero = PageRequest {
            after: None,
            limit: Some(0),
        };
        assert_eq!(zero.limit(), 1);
        let huge = PageRequest {
            after: None,
            limit: Some(10_000),
        };
        assert_eq!(huge.limit(), MAX_PAGE_SIZE);
        assert_eq!(huge.fetch_limit(), 101);
    }

    #[test]
    fn overfetch_sets_next_cursor() {
        let request = PageRequest {
            after: None,
            limit: Some(3),
        };
        let page = Page::from_overfetch(vec![10, 9, 8, 7], &request, |id| *id);
        assert_eq!(page.items, vec![10, 9, 8]);
        assert_eq!(page.next_cursor, Some(8));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let request = PageRequest {
            after: Some(8),
            limit: Some(3),
        };
        let page = Page::from_overfetch(vec![7, 6], &request, |id| *id);
        assert_eq!(page.items, vec![7, 6]);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn consecutive_pages_never_repeat_ids() {
        let all: Vec<i32> = (1..=10).rev().collect();
        let mut seen = Vec::new();
        let mut after = None;
        loop {
            let request = PageRequest {
                after,
                limit: Some(4),
            };
            let rows: Vec<i32> = all
                .iter()
                .copied()
                .filter(|id| after.is_none_or(|a| *id < a))
                .take(usize::try_from(request.fetch_limit()).unwrap_or(0))
                .collect();
            let page = Page::from_overfetch(rows, &request, |id| *id);
            seen.extend(page.items.iter().copied());
            match page.next_cursor {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }
        assert_eq!(seen, all);
    }
}
