//! SQLite-backed persistence for the href store.
//!
//! Access is async via tokio-rusqlite with WAL mode and versioned
//! migrations. [`CacheDb`] implements [`crate::store::HrefStoreAccess`].

pub mod connection;
pub mod hrefs;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
