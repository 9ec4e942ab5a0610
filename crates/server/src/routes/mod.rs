//! HTTP routes.

pub mod health;
pub mod linked_webfingers;
pub mod messages;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/api/linked-webfingers", get(linked_webfingers::linked_webfingers))
        .route("/api/messages", post(messages::post_message))
        .route("/api/profiles", get(messages::list_profiles))
        .route("/api/profile", get(messages::get_profile))
        .with_state(state)
}

/// CORS layer for `origins`; a `"*"` entry allows any origin.
pub fn cors(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }

    let origins: Vec<_> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Html;
    use relme_client::WebfingerResolver;
    use relme_core::{
        AppConfig, Error, FreshnessPolicy, MemoryHrefStore, Profile, ProfileCache, ProfileData, ProfileFetcher,
    };
    use tower::ServiceExt;

    use super::linked_webfingers::CACHE_CONTROL;

    struct AliceFetcher;

    #[async_trait]
    impl ProfileFetcher for AliceFetcher {
        async fn fetch_profile(&self, rel_me_href: &str) -> Result<ProfileData, Error> {
            if rel_me_href.ends_with("/@alice") {
                Ok(ProfileData::Profile(Profile { name: Some("Alice".into()), ..Default::default() }))
            } else {
                Ok(ProfileData::NotProfile)
            }
        }
    }

    fn app() -> Router {
        let config = AppConfig { allow_private_hosts: true, ..Default::default() };
        let cache = ProfileCache::new(Arc::new(MemoryHrefStore::new()), Arc::new(AliceFetcher), FreshnessPolicy::default());
        let resolver = WebfingerResolver::from_config(&config).unwrap();
        router(AppState { cache, resolver })
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn page_server() -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = Router::new().route("/plain", get(|| async { Html("<html><body>no links</body></html>") }));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = app().oneshot(Request::get("/healthz").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_linked_webfingers_missing_url() {
        let response =
            app().oneshot(Request::get("/api/linked-webfingers").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_linked_webfingers_malformed_url() {
        let response = app()
            .oneshot(Request::get("/api/linked-webfingers?url=ftp%3A%2F%2Fexample.com").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_linked_webfingers_requires_absolute_url() {
        let response = app()
            .oneshot(Request::get("/api/linked-webfingers?url=alice.example").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_string(response).await, "");
    }

    #[tokio::test]
    async fn test_linked_webfingers_page_without_links() {
        let addr = page_server().await;
        let uri = format!("/api/linked-webfingers?url=http%3A%2F%2F{addr}%2Fplain");
        let response = app().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CACHE_CONTROL).unwrap(), CACHE_CONTROL);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn test_messages_round_trip() {
        let app = app();

        let sighting = post_json(
            "/api/messages",
            serde_json::json!({
                "name": "HREF_PAYLOAD",
                "args": {"relMeHref": "https://example.social/@alice", "tabUrl": "https://alice.example/"}
            }),
        );
        let response = app.clone().oneshot(sighting).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "null");

        let response = app.clone().oneshot(Request::get("/api/profiles").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let records: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(records[0]["relMeHref"], "https://example.social/@alice");
        assert_eq!(records[0]["websiteUrl"], "https://alice.example/");
        assert_eq!(records[0]["profileData"]["type"], "profile");
        assert_eq!(records[0]["profileData"]["name"], "Alice");

        let refresh = post_json(
            "/api/messages",
            serde_json::json!({"name": "FETCH_PROFILE_UPDATE", "args": {"relMeHref": "https://example.social/@alice"}}),
        );
        let response = app.clone().oneshot(refresh).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "false");

        let uri = "/api/profile?href=https%3A%2F%2Fexample.social%2F%40alice";
        let response = app.clone().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let record: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(record["profileData"]["name"], "Alice");

        let uri = "/api/profile?href=https%3A%2F%2Fexample.social%2F%40nobody";
        let response = app.oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_message_rejected() {
        let request = post_json("/api/messages", serde_json::json!({"name": "DELETE_EVERYTHING", "args": {}}));
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_cors_with_explicit_origins() {
        let _layer = cors(&["https://alice.example".to_string(), "not a header\n".to_string()]);
        let _any = cors(&["*".to_string()]);
    }
}
