//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{Page, PageLocator, PaginationConfig, Paginator};
use crate::error::{Error, Result};
use crate::types::{PaginationMode, QueryParams};
use url::Url;

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Next-link pagination
///
/// Each response names the URL of the following page, so pages can only be
/// fetched one after another. The next link already embeds the query, so
/// follow-up locators carry no parameters of their own.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    endpoint: Url,
    query: QueryParams,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(config: &PaginationConfig) -> Result<Self> {
        Ok(Self {
            endpoint: Url::parse(&config.endpoint)?,
            query: config.base_query(),
        })
    }
}

impl Paginator for CursorPaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Cursor
    }

    fn first(&self) -> PageLocator {
        PageLocator::new(0, self.endpoint.as_str()).with_query(self.query.clone())
    }

    fn locator_for(&self, index: usize) -> Option<PageLocator> {
        (index == 0).then(|| self.first())
    }

    fn next(&self, page: &Page) -> Result<Option<PageLocator>> {
        if page.is_empty() {
            return Ok(None);
        }
        let Some(link) = page.next_url.as_deref() else {
            return Ok(None);
        };

        // Relative links resolve against the endpoint
        let url = self.endpoint.join(link).map_err(|e| {
            Error::fatal(
                link,
                None,
                format!("page {} returned an unusable next link: {e}", page.index),
            )
        })?;
        Ok(Some(PageLocator::new(page.index + 1, url)))
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination (e.g. `?$skip=200`)
///
/// The locator of page `n` sets the skip parameter to `n * page_size`, so any
/// page can be requested before its predecessors arrive.
#[derive(Debug, Clone)]
pub struct OffsetPaginator {
    endpoint: Url,
    query: QueryParams,
    skip_param: String,
    top_param: Option<String>,
    page_size: u32,
}

impl OffsetPaginator {
    /// Create a new offset paginator
    pub fn new(config: &PaginationConfig) -> Result<Self> {
        if config.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be at least 1"));
        }
        Ok(Self {
            endpoint: Url::parse(&config.endpoint)?,
            query: config.base_query(),
            skip_param: config.skip_param.clone(),
            top_param: config.top_param.clone(),
            page_size: config.page_size,
        })
    }

    /// Offset of the first item on page `index`
    pub fn offset_of(&self, index: usize) -> u64 {
        index as u64 * u64::from(self.page_size)
    }
}

impl Paginator for OffsetPaginator {
    fn mode(&self) -> PaginationMode {
        PaginationMode::Offset
    }

    fn first(&self) -> PageLocator {
        self.build_locator(0)
    }

    fn locator_for(&self, index: usize) -> Option<PageLocator> {
        Some(self.build_locator(index))
    }

    fn next(&self, page: &Page) -> Result<Option<PageLocator>> {
        if page.is_terminal() {
            return Ok(None);
        }
        Ok(Some(self.build_locator(page.index + 1)))
    }
}

impl OffsetPaginator {
    fn build_locator(&self, index: usize) -> PageLocator {
        let mut query = self.query.clone();
        query.push((self.skip_param.clone(), self.offset_of(index).to_string()));
        if let Some(top) = &self.top_param {
            query.push((top.clone(), self.page_size.to_string()));
        }
        PageLocator::new(index, self.endpoint.as_str()).with_query(query)
    }
}

/// Build the paginator for a config
pub fn create_paginator(config: &PaginationConfig) -> Result<Box<dyn Paginator>> {
    match config.mode {
        PaginationMode::Cursor => Ok(Box::new(CursorPaginator::new(config)?)),
        PaginationMode::Offset => Ok(Box::new(OffsetPaginator::new(config)?)),
    }
}
