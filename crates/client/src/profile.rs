//! Live profile lookup over WebFinger and ActivityPub.
//!
//! A `rel=me` href is a profile when its host's WebFinger record has a
//! `self` link to an ActivityPub actor and that actor document can be
//! fetched. Timeouts and transport failures surface as errors. Every other
//! failure means the href is not a profile.

use async_trait::async_trait;
use relme_core::{Error, Profile, ProfileData, ProfileFetcher};
use serde_json::Value;
use url::Url;

use crate::resolver::WebfingerResolver;
use crate::webfinger::{ACTIVITY_JSON, LD_JSON_ACTIVITYSTREAMS};

/// ActivityStreams object types that describe an actor.
const ACTOR_TYPES: &[&str] = &["Person", "Service", "Application", "Group", "Organization"];

#[derive(Debug, Clone)]
pub struct HttpProfileFetcher {
    resolver: WebfingerResolver,
}

impl HttpProfileFetcher {
    pub fn new(resolver: WebfingerResolver) -> Self {
        Self { resolver }
    }

    async fn lookup(&self, rel_me_href: &str) -> Result<ProfileData, Error> {
        let href = Url::parse(rel_me_href).map_err(|e| Error::InvalidUrl(format!("{rel_me_href}: {e}")))?;
        let webfinger = self.resolver.lookup(&href).await?;

        let Some(actor_href) = webfinger.activity_pub_actor() else {
            tracing::debug!(href = rel_me_href, subject = %webfinger.subject, "no actor link");
            return Ok(ProfileData::NotProfile);
        };
        let actor_url = Url::parse(actor_href).map_err(|e| Error::InvalidUrl(format!("{actor_href}: {e}")))?;

        let accept = format!("{ACTIVITY_JSON}, {LD_JSON_ACTIVITYSTREAMS}");
        let response = self.resolver.client().fetch_url(actor_url, &accept).await?;
        let actor: Value = response.json().map_err(|e| Error::InvalidInput(format!("actor document: {e}")))?;

        Ok(match profile_from_actor(&actor, &webfinger.subject) {
            Some(profile) => ProfileData::Profile(profile),
            None => {
                tracing::debug!(href = rel_me_href, "actor document is not an actor");
                ProfileData::NotProfile
            }
        })
    }
}

#[async_trait]
impl ProfileFetcher for HttpProfileFetcher {
    async fn fetch_profile(&self, rel_me_href: &str) -> Result<ProfileData, Error> {
        match self.lookup(rel_me_href).await {
            Ok(data) => Ok(data),
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                tracing::debug!(href = rel_me_href, error = %e, "href is not a profile");
                Ok(ProfileData::NotProfile)
            }
        }
    }
}

/// Map an ActivityPub actor document to a [`Profile`].
///
/// Returns `None` when `actor` is not an object of an actor type.
pub fn profile_from_actor(actor: &Value, subject: &str) -> Option<Profile> {
    let object = actor.as_object()?;
    let kind = object.get("type").and_then(Value::as_str)?;
    if !ACTOR_TYPES.contains(&kind) {
        return None;
    }

    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

    Some(Profile {
        name: text("name"),
        username: text("preferredUsername"),
        summary: text("summary"),
        avatar: object.get("icon").and_then(image_url),
        header: object.get("image").and_then(image_url),
        url: object.get("url").and_then(link_href),
        acct: Some(subject.to_string()),
    })
}

/// `icon` and `image` are an Image object, a bare URL, or a list of either.
fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(object) => object.get("url").and_then(link_href),
        Value::Array(items) => items.iter().find_map(image_url),
        _ => None,
    }
}

/// `url` is a bare URL, a Link object, or a list of either.
fn link_href(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(object) => object.get("href").and_then(Value::as_str).map(str::to_string),
        Value::Array(items) => items.iter().find_map(link_href),
        _ => None,
    }
}
