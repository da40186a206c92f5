//! Pagination types and traits
//!
//! Defines page locators, fetched pages and the paginator abstraction used by
//! the driver.

use crate::error::Result;
use crate::types::{JsonObject, PaginationMode, QueryParams};
use url::Url;

/// Default query parameter carrying the page offset
pub const DEFAULT_SKIP_PARAM: &str = "$skip";

/// Default query parameter carrying the filter expression
pub const DEFAULT_FILTER_PARAM: &str = "$filter";

/// Address of one page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocator {
    /// Position of the page in the chain, counted from 0
    pub index: usize,
    /// Base URL of the request
    pub url: String,
    /// Query parameters appended to `url`, in order
    pub query: QueryParams,
}

impl PageLocator {
    /// Create a locator with no extra query parameters
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
            query: Vec::new(),
        }
    }

    /// Set the query parameters
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// The request URL with the query parameters encoded into it
    pub fn full_url(&self) -> Result<String> {
        let mut url = Url::parse(&self.url)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url.into())
    }
}

/// One fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Index of the locator this page was fetched from
    pub index: usize,
    /// Raw item records in response order
    pub items: Vec<JsonObject>,
    /// Next-page link reported by the server
    pub next_url: Option<String>,
}

impl Page {
    /// Create a page
    pub fn new(index: usize, items: Vec<JsonObject>, next_url: Option<String>) -> Self {
        Self {
            index,
            items,
            next_url,
        }
    }

    /// Number of items on the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page carries no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// A page with no items or no next link ends the chain
    pub fn is_terminal(&self) -> bool {
        self.items.is_empty() || self.next_url.is_none()
    }
}

/// Configuration for building a paginator
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// Endpoint of the first page
    pub endpoint: String,
    /// How locators are derived
    pub mode: PaginationMode,
    /// Items the server returns per page
    pub page_size: u32,
    /// Query parameter carrying the offset (offset mode)
    pub skip_param: String,
    /// Query parameter carrying the page size, if the API accepts one
    pub top_param: Option<String>,
    /// Filter expression sent with every offset request and the first cursor request
    pub filter: Option<String>,
    /// Query parameter carrying the filter expression
    pub filter_param: String,
    /// Fixed query parameters sent alongside the filter
    pub extra_params: QueryParams,
}

impl PaginationConfig {
    /// Create a config for the given endpoint and mode with default parameter names
    pub fn new(endpoint: impl Into<String>, mode: PaginationMode) -> Self {
        Self {
            endpoint: endpoint.into(),
            mode,
            page_size: 100,
            skip_param: DEFAULT_SKIP_PARAM.to_string(),
            top_param: None,
            filter: None,
            filter_param: DEFAULT_FILTER_PARAM.to_string(),
            extra_params: Vec::new(),
        }
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the filter expression
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the page size parameter name
    #[must_use]
    pub fn top_param(mut self, name: impl Into<String>) -> Self {
        self.top_param = Some(name.into());
        self
    }

    /// Add a fixed query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }

    /// Query parameters shared by every request: fixed params, then the filter
    pub(crate) fn base_query(&self) -> QueryParams {
        let mut query = self.extra_params.clone();
        if let Some(filter) = &self.filter {
            query.push((self.filter_param.clone(), filter.clone()));
        }
        query
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// The pagination scheme this paginator implements
    fn mode(&self) -> PaginationMode;

    /// Locator of the first page
    fn first(&self) -> PageLocator;

    /// Locator for an arbitrary index, when it is derivable without earlier pages
    fn locator_for(&self, index: usize) -> Option<PageLocator>;

    /// Locator following `page`, or `None` when `page` ends the chain
    fn next(&self, page: &Page) -> Result<Option<PageLocator>>;
}
