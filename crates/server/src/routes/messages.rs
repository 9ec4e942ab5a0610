//! `POST /api/messages`, `GET /api/profiles` and `GET /api/profile?href=`.

use axum::Json;
use axum::extract::{Query, State};
use relme_core::{HrefRecord, Message, MessageReply};
use serde::Deserialize;

use crate::error::WebError;
use crate::state::AppState;

pub async fn post_message(
    State(state): State<AppState>, Json(message): Json<Message>,
) -> Result<Json<MessageReply>, WebError> {
    tracing::debug!(?message, "message");
    Ok(Json(state.cache.handle(message).await?))
}

pub async fn list_profiles(State(state): State<AppState>) -> Result<Json<Vec<HrefRecord>>, WebError> {
    Ok(Json(state.cache.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    href: String,
}

pub async fn get_profile(
    State(state): State<AppState>, Query(query): Query<ProfileQuery>,
) -> Result<Json<HrefRecord>, WebError> {
    state
        .cache
        .get(&query.href)
        .await?
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("no cached record for {}", query.href)))
}
