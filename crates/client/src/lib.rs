//! Client code for relme.
//!
//! This crate provides the HTTP fetch pipeline, `rel=me` extraction,
//! WebFinger lookups and the ActivityPub-backed profile fetcher used by the
//! server.

pub mod extract;
pub mod fetch;
pub mod profile;
pub mod resolver;
pub mod webfinger;

pub use extract::extract_rel_me_links;
pub use fetch::{FetchClient, FetchConfig, FetchResponse};
pub use profile::HttpProfileFetcher;
pub use resolver::{LinkedWebfinger, WebfingerResolver};
pub use webfinger::{WebfingerLink, WebfingerRecord};
