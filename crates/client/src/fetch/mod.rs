//! HTTP fetch pipeline with SSRF protection and size limits.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Safety Gates
//! - Deny private ranges (RFC1918, link-local, localhost, etc.) after DNS
//!   resolution, unless `allow_private_hosts` is set.
//! - Redirects are followed by hand so every hop passes the same gate.
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Every request carries a timeout.

pub mod ssrf;
pub mod url;

use bytes::{Bytes, BytesMut};
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use ssrf::{SsrfError, check_url, validate_ip};
pub use self::url::{UrlError, canonicalize, resolve_href};

use relme_core::{AppConfig, Error};

/// Accept header for HTML page fetches.
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Accept header for WebFinger lookups.
pub const ACCEPT_JRD: &str = "application/jrd+json, application/json;q=0.9";

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "relme/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Skip the SSRF gate (default: false)
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "relme/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
            allow_private_hosts: false,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            allow_private_hosts: config.allow_private_hosts,
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested, after canonicalization
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }
}

fn request_error(err: reqwest::Error, url: &Url) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(url.to_string())
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

/// HTTP fetch client with safety checks.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL string, canonicalizing it first.
    pub async fn fetch(&self, url_str: &str, accept: &str) -> Result<FetchResponse, Error> {
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        self.fetch_url(url, accept).await
    }

    /// Fetch an already-parsed URL, returning raw bytes and metadata.
    ///
    /// Performs the SSRF check on the URL and on every redirect target, and
    /// enforces the status and byte limits.
    pub async fn fetch_url(&self, url: Url, accept: &str) -> Result<FetchResponse, Error> {
        self.check_host(&url).await?;
        self.fetch_checked(url, accept).await
    }

    async fn check_host(&self, url: &Url) -> Result<(), Error> {
        if self.config.allow_private_hosts {
            return Ok(());
        }
        check_url(url).await.map_err(|e| Error::SsrfBlocked(format!("{url}: {e}")))
    }

    /// Fetch `url`, whose host the caller already checked.
    async fn fetch_checked(&self, url: Url, accept: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let mut current = url.clone();
        let mut redirects = 0usize;

        let mut response = loop {
            let response = self
                .http
                .get(current.as_str())
                .header(header::ACCEPT, accept)
                .send()
                .await
                .map_err(|e| request_error(e, &current))?;

            if !response.status().is_redirection() {
                break response;
            }
            let Some(location) = response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()) else {
                break response;
            };

            if redirects >= self.config.max_redirects {
                return Err(Error::HttpError(format!("{url}: more than {} redirects", self.config.max_redirects)));
            }
            redirects += 1;

            let next = current
                .join(location)
                .map_err(|e| Error::InvalidUrl(format!("redirect from {current}: {e}")))?;
            match next.scheme() {
                "http" | "https" => {}
                scheme => return Err(Error::InvalidUrl(format!("redirect to unsupported scheme: {scheme}"))),
            }
            self.check_host(&next).await?;

            tracing::debug!(from = %current, to = %next, "following redirect");
            current = next;
        };

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("{url}: status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| request_error(e, &current))? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(Error::FetchTooLarge(format!("body exceeds {} bytes", self.config.max_bytes)));
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(url = %url, final_url = %current, fetch_ms, bytes = bytes.len(), "fetched");

        Ok(FetchResponse { url, final_url: current, status, content_type, bytes, fetch_ms })
    }
}
