//! Profile freshness cache.
//!
//! Records `rel=me` sightings and refreshes cached profiles. Policy:
//!
//! - every sighting first sweeps `notProfile` records older than
//!   [`FreshnessPolicy::not_profile_expiry`]
//! - a known href is never re-fetched on sighting
//! - a refresh only touches existing `profile` records outside the
//!   [`FreshnessPolicy::update_cooldown`] window, and only writes when the
//!   fetched profile differs in at least one field
//! - a refresh never turns a `profile` into a `notProfile`
//!
//! Fetches run between store transforms, never inside one.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::Error;
use crate::clock::{Clock, SystemClock};
use crate::model::{HrefRecord, HrefStore, Profile, ProfileData};
use crate::store::{HrefStoreAccess, apply_with};

/// Live (uncached) profile lookup for a `rel=me` href.
#[async_trait]
pub trait ProfileFetcher: Send + Sync {
    /// Resolve `rel_me_href` to profile data.
    ///
    /// `Ok(ProfileData::NotProfile)` means the href was reachable but is not
    /// a profile. `Err` is reserved for failures that say nothing about the
    /// target, such as timeouts.
    async fn fetch_profile(&self, rel_me_href: &str) -> Result<ProfileData, Error>;
}

/// Expiry and cooldown windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// How long a `notProfile` record survives, measured from `viewed_at`.
    pub not_profile_expiry: Duration,
    /// Minimum gap between refreshes, measured from `updated_at` or `viewed_at`.
    pub update_cooldown: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self { not_profile_expiry: Duration::days(1), update_cooldown: Duration::hours(1) }
    }
}

impl FreshnessPolicy {
    /// A window that runs past the representable range never ends.
    pub fn is_expired(&self, record: &HrefRecord, now: DateTime<Utc>) -> bool {
        !record.profile_data.is_profile()
            && record.viewed_at.checked_add_signed(self.not_profile_expiry).is_some_and(|expires| expires < now)
    }

    pub fn in_cooldown(&self, record: &HrefRecord, now: DateTime<Utc>) -> bool {
        record.last_touched().checked_add_signed(self.update_cooldown).is_none_or(|ready| ready > now)
    }
}

/// What a refresh did, before it is collapsed to a boolean.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The record now holds this profile.
    Updated(Profile),
    /// Fetched data was `notProfile` or identical to the stored profile.
    Unchanged,
    /// Refreshed or first viewed too recently.
    Cooldown,
    /// No record, or the record is `notProfile`.
    NotCached,
    /// The href is not an absolute URL.
    Invalid,
    /// The fetch failed.
    FetchFailed,
    /// Reading or writing the store failed.
    StoreFailed,
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated(_))
    }
}

/// Returns the store without expired `notProfile` records, or `None` if
/// nothing expired.
fn sweep_expired(current: &HrefStore, policy: &FreshnessPolicy, now: DateTime<Utc>) -> Option<HrefStore> {
    if !current.values().any(|record| policy.is_expired(record, now)) {
        return None;
    }

    let next: HrefStore = current
        .iter()
        .filter(|(_, record)| !policy.is_expired(record, now))
        .map(|(key, record)| (key.clone(), record.clone()))
        .collect();

    debug!(swept = current.len() - next.len(), "expired notProfile records");
    Some(next)
}

/// Cache of profile records keyed by `rel=me` href.
#[derive(Clone)]
pub struct ProfileCache {
    store: Arc<dyn HrefStoreAccess>,
    fetcher: Arc<dyn ProfileFetcher>,
    clock: Arc<dyn Clock>,
    policy: FreshnessPolicy,
}

impl ProfileCache {
    pub fn new(store: Arc<dyn HrefStoreAccess>, fetcher: Arc<dyn ProfileFetcher>, policy: FreshnessPolicy) -> Self {
        Self { store, fetcher, clock: Arc::new(SystemClock), policy }
    }

    /// Replace the wall clock, e.g. with a manual clock in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Record that `rel_me_href` was seen on `website_url`.
    ///
    /// Sweeps expired `notProfile` records, then fetches and stores profile
    /// data if the href is not already known. Two concurrent first sightings
    /// of the same href both fetch; the later write wins.
    pub async fn record_sighting(&self, rel_me_href: &str, website_url: &str) -> Result<(), Error> {
        let now = self.clock.now();
        let policy = self.policy;
        let swept = self
            .store
            .apply(Box::new(move |current| sweep_expired(current, &policy, now)))
            .await?;

        if swept.contains_key(rel_me_href) {
            debug!(rel_me_href, "href already cached");
            return Ok(());
        }

        let profile_data = match self.fetcher.fetch_profile(rel_me_href).await {
            Ok(data) => data,
            Err(e) => {
                warn!(rel_me_href, error = %e, "profile fetch failed, caching as notProfile");
                ProfileData::NotProfile
            }
        };

        let record = HrefRecord {
            rel_me_href: rel_me_href.to_string(),
            website_url: website_url.to_string(),
            profile_data,
            viewed_at: self.clock.now(),
            updated_at: None,
        };
        debug!(rel_me_href, is_profile = record.profile_data.is_profile(), "caching sighted href");

        self.store
            .apply(Box::new(move |current| {
                let mut next = current.clone();
                next.insert(record.rel_me_href.clone(), record);
                Some(next)
            }))
            .await?;

        Ok(())
    }

    /// Re-fetch a cached profile. Returns true iff the record was updated.
    pub async fn refresh_profile(&self, rel_me_href: &str) -> bool {
        self.try_refresh(rel_me_href).await.is_updated()
    }

    /// Re-fetch a cached profile, reporting why nothing changed when it didn't.
    pub async fn try_refresh(&self, rel_me_href: &str) -> RefreshOutcome {
        if url::Url::parse(rel_me_href).is_err() {
            debug!(rel_me_href, "refresh skipped: not an absolute URL");
            return RefreshOutcome::Invalid;
        }

        let existing = match self.store.snapshot().await {
            Ok(store) => store.get(rel_me_href).cloned(),
            Err(e) => {
                warn!(rel_me_href, error = %e, "refresh skipped: store unavailable");
                return RefreshOutcome::StoreFailed;
            }
        };

        let Some(existing) = existing.filter(|record| record.profile_data.is_profile()) else {
            debug!(rel_me_href, "refresh skipped: no cached profile");
            return RefreshOutcome::NotCached;
        };

        if self.policy.in_cooldown(&existing, self.clock.now()) {
            debug!(rel_me_href, "refresh skipped: updated recently");
            return RefreshOutcome::Cooldown;
        }

        let fresh = match self.fetcher.fetch_profile(rel_me_href).await {
            Ok(ProfileData::Profile(profile)) => profile,
            Ok(ProfileData::NotProfile) => {
                debug!(rel_me_href, "refresh discarded: fetched notProfile");
                return RefreshOutcome::Unchanged;
            }
            Err(e) => {
                warn!(rel_me_href, error = %e, "refresh fetch failed");
                return RefreshOutcome::FetchFailed;
            }
        };

        let now = self.clock.now();
        let policy = self.policy;
        let key = rel_me_href.to_string();
        let result = apply_with(self.store.as_ref(), move |current| {
            let Some(record) = current.get(&key) else {
                return (None, RefreshOutcome::NotCached);
            };
            let Some(stored) = record.profile_data.as_profile() else {
                return (None, RefreshOutcome::NotCached);
            };
            // Another refresh may have landed while this one was fetching.
            if policy.in_cooldown(record, now) {
                return (None, RefreshOutcome::Cooldown);
            }
            if stored.same_fields(&fresh) {
                return (None, RefreshOutcome::Unchanged);
            }

            let updated = HrefRecord {
                profile_data: ProfileData::Profile(fresh.clone()),
                updated_at: Some(now.max(record.viewed_at)),
                ..record.clone()
            };
            let mut next = current.clone();
            next.insert(key, updated);
            (Some(next), RefreshOutcome::Updated(fresh))
        })
        .await;

        match result {
            Ok((_, outcome)) => {
                if outcome.is_updated() {
                    info!(rel_me_href, "profile updated");
                } else {
                    debug!(rel_me_href, ?outcome, "refresh made no change");
                }
                outcome
            }
            Err(e) => {
                warn!(rel_me_href, error = %e, "refresh write failed");
                RefreshOutcome::StoreFailed
            }
        }
    }

    /// The cached record for `rel_me_href`, if any.
    pub async fn get(&self, rel_me_href: &str) -> Result<Option<HrefRecord>, Error> {
        Ok(self.store.snapshot().await?.remove(rel_me_href))
    }

    /// All cached records, ordered by href.
    pub async fn list(&self) -> Result<Vec<HrefRecord>, Error> {
        Ok(self.store.snapshot().await?.into_values().collect())
    }
}
