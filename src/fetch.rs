//! Page fetching
//!
//! A [`PageFetcher`] turns one [`PageLocator`] into one [`Page`] with a single
//! attempt. Retrying is layered on top by [`crate::retry::RetryPolicy`].

use crate::decode::EnvelopeDecoder;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::{Page, PageLocator};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Fetches a single page of results
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and decode the page at `locator`
    ///
    /// Fails with [`Error::TransientFetch`] for failures worth retrying and
    /// [`Error::FatalFetch`] for everything else.
    async fn fetch(&self, locator: &PageLocator) -> Result<Page>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, locator: &PageLocator) -> Result<Page> {
        (**self).fetch(locator).await
    }
}

/// Page fetcher backed by the shared HTTP client
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Arc<HttpClient>,
    decoder: EnvelopeDecoder,
}

impl HttpPageFetcher {
    /// Create a fetcher using the default envelope layout
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self::with_decoder(client, EnvelopeDecoder::default())
    }

    /// Create a fetcher with a custom envelope decoder
    pub fn with_decoder(client: Arc<HttpClient>, decoder: EnvelopeDecoder) -> Self {
        Self { client, decoder }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, locator: &PageLocator) -> Result<Page> {
        let url = locator
            .full_url()
            .map_err(|e| Error::fatal(&locator.url, None, e.to_string()))?;

        let body = self.client.get_text(&url).await?;

        // A body we cannot decode will not improve on retry
        let envelope = self
            .decoder
            .decode(&body)
            .map_err(|e| Error::fatal(&url, None, e.to_string()))?;

        debug!(
            page = locator.index,
            items = envelope.items.len(),
            has_next = envelope.next_url.is_some(),
            "Fetched page"
        );
        Ok(Page::new(locator.index, envelope.items, envelope.next_url))
    }
}
