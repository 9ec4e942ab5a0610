//! Core types and shared functionality for relme.
//!
//! This crate provides:
//! - The href record model and the profile freshness cache
//! - Atomic store access with in-memory and SQLite backends
//! - The UI message protocol
//! - Unified error types and layered configuration

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod freshness;
pub mod messages;
pub mod model;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::CacheDb;
pub use clock::{Clock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use freshness::{FreshnessPolicy, ProfileCache, ProfileFetcher, RefreshOutcome};
pub use messages::{Message, MessageReply};
pub use model::{HrefRecord, HrefStore, Profile, ProfileData};
pub use store::{HrefStoreAccess, MemoryHrefStore};
