//! WebFinger (RFC 7033) JRD documents.

use std::collections::BTreeMap;

use relme_core::Error;
use serde::{Deserialize, Serialize};
use url::Url;

/// Well-known path every WebFinger host serves.
pub const WEBFINGER_PATH: &str = "/.well-known/webfinger";

/// Media type of an ActivityPub actor document.
pub const ACTIVITY_JSON: &str = "application/activity+json";

/// JSON-LD media type with the ActivityStreams profile.
pub const LD_JSON_ACTIVITYSTREAMS: &str = r#"application/ld+json; profile="https://www.w3.org/ns/activitystreams""#;

/// A JRD response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebfingerRecord {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<WebfingerLink>>,
}

/// A link relation in a JRD response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebfingerLink {
    pub rel: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titles: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Option<String>>>,
}

impl WebfingerRecord {
    pub fn links(&self) -> &[WebfingerLink] {
        self.links.as_deref().unwrap_or_default()
    }

    /// The href of the `self` link that points at an ActivityPub actor.
    pub fn activity_pub_actor(&self) -> Option<&str> {
        self.links()
            .iter()
            .filter(|link| link.rel == "self")
            .find(|link| link.media_type.as_deref().is_some_and(is_activity_streams))
            .and_then(|link| link.href.as_deref())
    }
}

/// Whether `media_type` names an ActivityStreams document.
pub fn is_activity_streams(media_type: &str) -> bool {
    let media_type = media_type.trim();
    if media_type.eq_ignore_ascii_case(ACTIVITY_JSON) {
        return true;
    }
    let lower = media_type.to_ascii_lowercase();
    lower.starts_with("application/ld+json") && lower.contains("https://www.w3.org/ns/activitystreams")
}

/// Build `{origin}/.well-known/webfinger?resource={href}` for a `rel=me` href.
pub fn webfinger_url(href: &Url) -> Result<Url, Error> {
    match href.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    let origin = href.origin().ascii_serialization();
    let mut url = Url::parse(&origin).map_err(|e| Error::InvalidUrl(format!("{href}: {e}")))?;
    url.set_path(WEBFINGER_PATH);
    url.query_pairs_mut().append_pair("resource", href.as_str());
    Ok(url)
}

/// Parse and validate a JRD body.
pub fn parse_webfinger(body: &[u8]) -> Result<WebfingerRecord, Error> {
    let record: WebfingerRecord =
        serde_json::from_slice(body).map_err(|e| Error::InvalidWebfinger(e.to_string()))?;

    if record.subject.trim().is_empty() {
        return Err(Error::InvalidWebfinger("empty subject".to_string()));
    }

    Ok(record)
}
