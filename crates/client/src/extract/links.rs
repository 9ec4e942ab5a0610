//! `rel=me` link harvesting from HTML documents.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::fetch::resolve_href;

/// Selector for `<link>` and `<a>` elements whose `rel` token list contains `me`.
const REL_ME_SELECTOR: &str = "link[rel~=me], a[rel~=me]";

/// Extract `rel=me` hrefs from an HTML document.
///
/// Relative hrefs are resolved against `base_url`. Empty, unparsable and
/// non-http(s) hrefs are skipped, and duplicates are removed keeping the
/// first occurrence.
pub fn extract_rel_me_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse(REL_ME_SELECTOR) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!(error = %e, "invalid rel=me selector");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let resolved = match resolve_href(base_url, href) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!(href, error = %e, "skipping rel=me href");
                continue;
            }
        };

        if seen.insert(resolved.to_string()) {
            links.push(resolved);
        }
    }

    links
}
