//! HTML extraction.
//!
//! Only `rel=me` links are harvested. Parsing uses `scraper`, which is
//! lenient with malformed markup, so extraction never fails; a page that
//! cannot be understood simply yields no links.

pub mod links;

pub use links::extract_rel_me_links;
