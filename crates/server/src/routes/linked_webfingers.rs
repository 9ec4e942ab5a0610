//! `GET /api/linked-webfingers?url=<page>`

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use relme_core::Error;
use serde::Deserialize;
use url::Url;

use crate::error::WebError;
use crate::state::AppState;

/// Edge caches keep a result for 12 hours and may serve it stale for 31 days.
pub const CACHE_CONTROL: &str = "public, s-maxage=43200, stale-while-revalidate=2678400, must-revalidate, max-age=0";

#[derive(Debug, Deserialize)]
pub struct LinkedWebfingersQuery {
    url: Option<String>,
}

pub async fn linked_webfingers(
    State(state): State<AppState>, Query(query): Query<LinkedWebfingersQuery>,
) -> Result<impl IntoResponse, WebError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| WebError::Bare(Error::InvalidInput("missing url query parameter".into())))?;
    let page = Url::parse(url.trim()).map_err(|e| WebError::Bare(Error::InvalidUrl(format!("{url}: {e}"))))?;

    let linked = state.resolver.resolve_linked_webfingers(page.as_str()).await.map_err(WebError::Bare)?;

    Ok(([(header::CACHE_CONTROL, CACHE_CONTROL)], axum::Json(linked)))
}
