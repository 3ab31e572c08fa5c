use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::keys;
use super::send;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api", create_api_router())
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/auth", post(auth::login))
        .route(
            "/keys",
            get(keys::list_keys)
                .post(keys::create_key)
                .put(keys::extend_key)
                .delete(keys::delete_key),
        )
        .route("/send", post(send::send_message))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::PanelCredentials;
    use crate::domain::relay::MockMessageRelay;
    use crate::domain::{AccessKeyRecord, KeyCollection, MessageRelay, RelayError};
    use crate::infrastructure::access_key::{AccessKeyService, KeyStore, ReadCache};
    use crate::infrastructure::document::InMemoryDocumentBackend;

    const PATH: &str = "keys.json";

    fn app_with(backend: Arc<InMemoryDocumentBackend>, relay: MockMessageRelay) -> Router {
        let relay: Arc<dyn MessageRelay> = Arc::new(relay);
        let store = Arc::new(KeyStore::new(backend.clone(), PATH));
        let cache = Arc::new(ReadCache::new(backend, PATH, Duration::from_secs(60)));
        let service = Arc::new(AccessKeyService::new(store, cache.clone(), relay));

        create_router(AppState::new(
            service,
            cache,
            PanelCredentials::new("admin", "hunter2"),
        ))
    }

    fn silent_relay() -> MockMessageRelay {
        let mut relay = MockMessageRelay::new();
        relay.expect_send_message().times(0);
        relay
    }

    fn panel_auth() -> String {
        format!("Basic {}", STANDARD.encode("admin:hunter2"))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, panel_auth())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, name: &str, days: i64) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/keys",
                json!({"name": name, "botToken": "123:abc", "chatId": 42, "days": days}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    async fn seed_expired(backend: &InMemoryDocumentBackend) {
        let now = Utc::now();
        let record = AccessKeyRecord::new(
            "Old",
            "key-old",
            "999:xyz",
            "77",
            now - chrono::Duration::days(31),
            now - chrono::Duration::days(1),
        );
        backend
            .seed(PATH, KeyCollection::from(vec![record]).to_document().unwrap())
            .await;
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app_with(Arc::new(InMemoryDocumentBackend::new()), silent_relay());

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::get("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_reflects_backend() {
        let backend = Arc::new(InMemoryDocumentBackend::new());
        backend.set_unavailable(true);
        let app = app_with(backend.clone(), silent_relay());

        let response = app
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        backend.set_unavailable(false);
        let response = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login() {
        let app = app_with(Arc::new(InMemoryDocumentBackend::new()), silent_relay());

        let ok = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth",
                json!({"username": "admin", "password": "hunter2"}),
            ))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(body_json(ok).await["success"], true);

        let bad = app
            .oneshot(json_request(
                "POST",
                "/api/auth",
                json!({"username": "admin", "password": "nope"}),
            ))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_keys_require_panel_credentials() {
        let app = app_with(Arc::new(InMemoryDocumentBackend::new()), silent_relay());

        let response = app
            .clone()
            .oneshot(Request::get("/api/keys").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let wrong = format!("Basic {}", STANDARD.encode("admin:wrong"));
        let response = app
            .oneshot(
                Request::get("/api/keys")
                    .header(header::AUTHORIZATION, wrong)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_key_lifecycle_over_http() {
        let backend = Arc::new(InMemoryDocumentBackend::new());
        let app = app_with(backend.clone(), silent_relay());

        let created = create(&app, "Alice", 7).await;
        let access_key = created["accessKey"].as_str().unwrap().to_string();
        assert!(access_key.starts_with("key-"));
        assert_eq!(created["chatId"], "42");
        assert_eq!(created["status"], "active");

        let listed = app
            .clone()
            .oneshot(json_request("GET", "/api/keys", Value::Null))
            .await
            .unwrap();
        assert_eq!(listed.status(), StatusCode::OK);
        let listed = body_json(listed).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["accessKey"], access_key.as_str());

        let extended = app
            .clone()
            .oneshot(json_request("PUT", "/api/keys", json!({"accessKey": access_key})))
            .await
            .unwrap();
        assert_eq!(extended.status(), StatusCode::OK);
        assert_ne!(body_json(extended).await["expiresAt"], created["expiresAt"]);

        let deleted = app
            .clone()
            .oneshot(json_request(
                "DELETE",
                &format!("/api/keys?key={}", access_key),
                Value::Null,
            ))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let stored = KeyCollection::from_document(&backend.content(PATH).await.unwrap()).unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_key_errors_map_to_statuses() {
        let app = app_with(Arc::new(InMemoryDocumentBackend::new()), silent_relay());

        let invalid = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/keys",
                json!({"name": "", "botToken": "t", "chatId": "1", "days": 3}),
            ))
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let missing = app
            .clone()
            .oneshot(json_request("PUT", "/api/keys", json!({"accessKey": "key-ghost"})))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let no_query = app
            .oneshot(json_request("DELETE", "/api/keys", Value::Null))
            .await
            .unwrap();
        assert_eq!(no_query.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_backend_outage_is_503() {
        let backend = Arc::new(InMemoryDocumentBackend::new());
        backend.set_unavailable(true);
        let app = app_with(backend, silent_relay());

        let response = app
            .oneshot(json_request("GET", "/api/keys", Value::Null))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "backend_unavailable"
        );
    }

    #[tokio::test]
    async fn test_send_delivers_for_valid_key() {
        let backend = Arc::new(InMemoryDocumentBackend::new());
        let mut relay = MockMessageRelay::new();
        relay
            .expect_send_message()
            .withf(|bot_token, chat_id, message| {
                bot_token == "123:abc" && chat_id == "42" && message.text == "ping"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let app = app_with(backend, relay);
        let created = create(&app, "Alice", 1).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/send",
                json!({"accessKey": created["accessKey"], "message": "ping"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_send_rejects_unknown_and_expired_keys() {
        let backend = Arc::new(InMemoryDocumentBackend::new());
        seed_expired(&backend).await;
        let mut relay = MockMessageRelay::new();
        // Only the expiry notice goes out
        relay
            .expect_send_message()
            .withf(|_, chat_id, _| chat_id == "77")
            .returning(|_, _, _| Ok(()));
        let app = app_with(backend, relay);

        let unknown = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/send",
                json!({"accessKey": "key-ghost", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(unknown.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(unknown).await["error"]["code"], "invalid_key");

        let expired = app
            .oneshot(json_request(
                "POST",
                "/api/send",
                json!({"accessKey": "key-old", "message": "hi"}),
            ))
            .await
            .unwrap();
        assert_eq!(expired.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(expired).await["error"]["code"], "expired_key");
    }

    #[tokio::test]
    async fn test_send_relay_failures() {
        let backend = Arc::new(InMemoryDocumentBackend::new());
        let mut relay = MockMessageRelay::new();
        let mut seq = mockall::Sequence::new();
        relay
            .expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(RelayError::rejected("Bad Request: chat not found")));
        relay
            .expect_send_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Err(RelayError::transport("connection reset")));
        let app = app_with(backend, relay);
        let created = create(&app, "Alice", 1).await;
        let body = json!({"accessKey": created["accessKey"], "message": "ping"});

        let misconfigured = app
            .clone()
            .oneshot(json_request("POST", "/api/send", body.clone()))
            .await
            .unwrap();
        assert_eq!(misconfigured.status(), StatusCode::BAD_REQUEST);

        let upstream = app
            .oneshot(json_request("POST", "/api/send", body))
            .await
            .unwrap();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = app_with(Arc::new(InMemoryDocumentBackend::new()), silent_relay());

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/send")
                    .header(header::ORIGIN, "https://panel.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
