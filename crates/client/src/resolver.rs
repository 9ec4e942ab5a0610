//! Linked WebFinger resolution.
//!
//! Fetch a page, harvest its `rel=me` hrefs and look each one up on its own
//! host's WebFinger endpoint. Lookups run concurrently, bounded by a
//! semaphore, and a failed lookup only drops its own href.

use std::sync::Arc;

use relme_core::{AppConfig, Error};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

use crate::extract::extract_rel_me_links;
use crate::fetch::{ACCEPT_HTML, ACCEPT_JRD, FetchClient, FetchConfig};
use crate::webfinger::{WebfingerRecord, parse_webfinger, webfinger_url};

/// A `rel=me` href together with the WebFinger record its host returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedWebfinger {
    pub webfinger: WebfingerRecord,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct WebfingerResolver {
    client: FetchClient,
    max_concurrency: usize,
}

impl WebfingerResolver {
    pub fn new(client: FetchClient, max_concurrency: usize) -> Self {
        Self { client, max_concurrency: max_concurrency.max(1) }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let client = FetchClient::new(FetchConfig::from(config))?;
        Ok(Self::new(client, config.max_concurrency))
    }

    pub fn client(&self) -> &FetchClient {
        &self.client
    }

    /// Fetch and validate the WebFinger record for one href.
    pub async fn lookup(&self, href: &Url) -> Result<WebfingerRecord, Error> {
        let url = webfinger_url(href)?;
        let response = self.client.fetch_url(url, ACCEPT_JRD).await?;
        parse_webfinger(&response.bytes)
    }

    /// Fetch `page_url` and return the `rel=me` hrefs it declares.
    ///
    /// Relative hrefs resolve against the final URL after redirects.
    pub async fn rel_me_links(&self, page_url: &str) -> Result<Vec<Url>, Error> {
        let page = self.client.fetch(page_url, ACCEPT_HTML).await?;
        let links = extract_rel_me_links(&page.text(), &page.final_url);
        tracing::debug!(page = %page.final_url, count = links.len(), "extracted rel=me links");
        Ok(links)
    }

    /// Resolve every `rel=me` href on `page_url` to its WebFinger record.
    ///
    /// Fails only when the page itself cannot be fetched. Hrefs whose lookup
    /// fails are left out, and the order of the result is unspecified.
    pub async fn resolve_linked_webfingers(&self, page_url: &str) -> Result<Vec<LinkedWebfinger>, Error> {
        let hrefs = self.rel_me_links(page_url).await?;

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut join_set = JoinSet::new();

        for href in hrefs {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };
            let resolver = self.clone();

            join_set.spawn(async move {
                let _permit = permit;
                let result = resolver.lookup(&href).await;
                (href, result)
            });
        }

        let mut linked = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((href, Ok(webfinger))) => linked.push(LinkedWebfinger { webfinger, url: href.to_string() }),
                Ok((href, Err(e))) => {
                    tracing::debug!(href = %href, error = %e, "dropping rel=me href without webfinger");
                }
                Err(e) => tracing::warn!(error = %e, "webfinger lookup task failed"),
            }
        }

        tracing::info!(page = page_url, resolved = linked.len(), "resolved linked webfingers");
        Ok(linked)
    }
}
