//! Paging and search parameters for list requests.

use serde::{Deserialize, Serialize};

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Active list parameters held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameQuery {
    /// 1-based page number.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
    /// Current search term, set by searches.
    pub search_text: Option<String>,
}

impl Default for GameQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search_text: None,
        }
    }
}

impl GameQuery {
    /// Shallow-merge `update` into the query. Fields left as `None` in the
    /// update keep their current value.
    pub fn merge(&mut self, update: GameQueryUpdate) {
        if let Some(page) = update.page {
            self.page = page.max(1);
        }
        if let Some(page_size) = update.page_size {
            self.page_size = page_size.max(1);
        }
        if let Some(search_text) = update.search_text {
            self.search_text = Some(search_text);
        }
    }
}

/// Partial update for [`GameQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameQueryUpdate {
    /// New page number.
    pub page: Option<u32>,
    /// New page size.
    pub page_size: Option<u32>,
    /// New search term.
    pub search_text: Option<String>,
}

impl GameQueryUpdate {
    /// Update that only moves to `page`.
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Also change the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Also change the search term.
    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }
}
