//! Paged list results and lazy page walking
//!
//! Every `list` call returns one [`PaginatedResult`]. [`paginate`] turns any such
//! page-fetching function into a lazy stream of items that keeps requesting pages
//! until the server returns a short (or empty) page.
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use pai_core::pagination::paginate;
//!
//! let all: Vec<Dataset> = paginate(
//!     |page, size| datasets.list(&filter, page, size),
//!     1,
//!     50,
//! )
//! .try_collect()
//! .await?;
//! ```

use futures::{Stream, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::{PaiError, Result};

/// Page size used by list operations when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One page of a list call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    /// Number of matching items across all pages
    pub total_count: u64,
    /// 1-based
    pub page_number: u32,
    pub page_size: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page_number: u32, page_size: u32) -> Self {
        Self {
            items,
            total_count,
            page_number,
            page_size,
        }
    }

    /// A short page ends the listing
    pub fn is_last_page(&self) -> bool {
        self.items.is_empty() || (self.items.len() as u64) < u64::from(self.page_size)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

/// Sort direction for list calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        })
    }
}

/// Paging and ordering options shared by every list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListOptions {
    pub page_number: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            order: None,
        }
    }
}

impl ListOptions {
    pub fn page(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.order = Some(order);
        self
    }

    /// Same ordering, different page
    #[must_use]
    pub fn at_page(&self, page_number: u32, page_size: u32) -> Self {
        Self {
            page_number,
            page_size,
            ..self.clone()
        }
    }
}

/// Walk pages lazily, yielding items one at a time
///
/// `fetch(page_number, page_size)` is called for `page_number`, then for each
/// following page until a page holds fewer than `page_size` items. A full page is
/// always followed by one more fetch, even if that page turns out empty. The first
/// error ends the stream.
///
/// The returned stream is single-pass; calling `paginate` again starts a fresh,
/// independent walk.
pub fn paginate<T, F, Fut>(
    fetch: F,
    page_number: u32,
    page_size: u32,
) -> impl Stream<Item = Result<T>>
where
    F: FnMut(u32, u32) -> Fut,
    Fut: Future<Output = Result<PaginatedResult<T>>>,
{
    let pages = stream::try_unfold(
        (fetch, Some(page_number)),
        move |(mut fetch, next)| async move {
            let Some(page) = next else {
                return Ok::<_, PaiError>(None);
            };
            let result = fetch(page, page_size).await?;
            let next = if (result.items.len() as u64) < u64::from(page_size)
                || result.items.is_empty()
            {
                None
            } else {
                Some(page + 1)
            };
            tracing::trace!(
                "Fetched page {} ({} items, total {})",
                page,
                result.items.len(),
                result.total_count
            );
            Ok(Some((result.items, (fetch, next))))
        },
    );

    pages
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
}
