//! Href records and the profile data they carry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile metadata resolved for a `rel=me` href.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Preferred username, without host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Bio as served by the remote (may contain HTML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Header/banner image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    /// Canonical profile page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// WebFinger subject, e.g. `acct:alice@example.social`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acct: Option<String>,
}

impl Profile {
    /// True when every field of `self` equals the same field of `other`.
    ///
    /// The destructuring is exhaustive, so adding a field to `Profile`
    /// fails to compile until it is compared here too.
    pub fn same_fields(&self, other: &Profile) -> bool {
        let Profile { name, username, summary, avatar, header, url, acct } = self;

        *name == other.name
            && *username == other.username
            && *summary == other.summary
            && *avatar == other.avatar
            && *header == other.header
            && *url == other.url
            && *acct == other.acct
    }
}

/// Result of a profile lookup: a profile, or a marker that the href is not one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProfileData {
    Profile(Profile),
    NotProfile,
}

impl ProfileData {
    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            ProfileData::Profile(profile) => Some(profile),
            ProfileData::NotProfile => None,
        }
    }

    pub fn is_profile(&self) -> bool {
        matches!(self, ProfileData::Profile(_))
    }
}

/// One record per distinct `rel=me` href ever sighted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HrefRecord {
    pub rel_me_href: String,
    /// Page on which the href was first seen.
    pub website_url: String,
    pub profile_data: ProfileData,
    /// First sighting.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub viewed_at: DateTime<Utc>,
    /// Last refresh that changed the profile.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "chrono::serde::ts_milliseconds_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl HrefRecord {
    /// The instant the refresh cooldown is measured from.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.viewed_at)
    }
}

/// All known records, keyed by `rel_me_href`.
pub type HrefStore = BTreeMap<String, HrefRecord>;
