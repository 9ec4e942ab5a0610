//! Message protocol between the UI and the profile cache.
//!
//! Messages arrive as `{"name": "...", "args": {...}}` and are routed to the
//! cache operation of the same name.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::freshness::ProfileCache;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrefPayloadArgs {
    pub rel_me_href: String,
    /// URL of the tab the href was found in.
    pub tab_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchProfileUpdateArgs {
    pub rel_me_href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "args", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// A `rel=me` href was seen on a page.
    HrefPayload(HrefPayloadArgs),
    /// Refresh a cached profile if it is due.
    FetchProfileUpdate(FetchProfileUpdateArgs),
}

/// Reply to a [`Message`]. Serializes as `null` or a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageReply {
    Done,
    Updated(bool),
}

impl ProfileCache {
    /// Route a message to its handler.
    pub async fn handle(&self, message: Message) -> Result<MessageReply, Error> {
        match message {
            Message::HrefPayload(args) => {
                self.record_sighting(&args.rel_me_href, &args.tab_url).await?;
                Ok(MessageReply::Done)
            }
            Message::FetchProfileUpdate(args) => Ok(MessageReply::Updated(self.refresh_profile(&args.rel_me_href).await)),
        }
    }
}
