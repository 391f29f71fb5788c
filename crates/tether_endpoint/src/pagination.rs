//! The paginated-response contract.
//!
//! Endpoints returning one page of a larger collection decode into a
//! response type implementing [`PaginatedResponse`], which converts itself
//! into a structurally partial [`PartialList`]. Conversion failures are
//! ordinary [`EndpointError`]s and surface as decode failures.

use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// One page of a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialList<T> {
    /// Items contained in this page.
    pub items: Vec<T>,
    /// Cursor of the next page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Total number of items across all pages, if the server reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> PartialList<T> {
    /// Creates a page with no follow-up cursor.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
            total: None,
        }
    }

    /// Returns `true` if no further page exists.
    #[must_use]
    pub fn is_last_page(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Maps every item, keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PartialList<U> {
        PartialList {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            total: self.total,
        }
    }
}

impl<T> Default for PartialList<T> {
    fn default() -> Self {
        Self::last(Vec::new())
    }
}

/// A response carrying one page of a collection.
pub trait PaginatedResponse {
    /// Item type of the collection.
    type Item;

    /// Converts the response into a partial list.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] if the page is structurally invalid.
    fn convert(self) -> Result<PartialList<Self::Item>, EndpointError>;
}

impl<T> PaginatedResponse for PartialList<T> {
    type Item = T;

    fn convert(self) -> Result<PartialList<T>, EndpointError> {
        Ok(self)
    }
}
