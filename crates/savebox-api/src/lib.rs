pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod saved;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tracing::error;

use savebox_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// All routes with their state attached. Cross-cutting layers (CORS,
/// tracing) are added by the server binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users/me", get(users::me))
        .route("/messages", get(messages::get_messages).post(messages::send_message))
        .route("/messages/{message_id}", delete(messages::delete_message))
        .route(
            "/messages/{message_id}/save",
            post(saved::save_message).delete(saved::unsave_message),
        )
        .route("/saved", get(saved::list_saved))
        .layer(axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run a database call off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> savebox_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::AppStateInner;

    fn app() -> Router {
        app_with_state().0
    }

    fn app_with_state() -> (Router, AppState) {
        let db = Database::open_in_memory().unwrap();
        let state = Arc::new(AppStateInner {
            db,
            jwt_secret: "test-secret".into(),
        });
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn register(app: &Router, username: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/saved", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let (status, _) = send(&app, Method::GET, "/saved", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_and_duplicate_username() {
        let app = app();
        register(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "alice", "password": "password456" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "username already taken");

        let (status, body) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");
        assert_eq!(body["user_id"].as_str().unwrap().len(), 24);

        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "wrong-password" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "bo", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn save_unsave_flow() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, msg) = send(
            &app,
            Method::POST,
            "/messages",
            Some(&token),
            Some(json!({ "body": "remember this" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let message_id = msg["id"].as_str().unwrap().to_string();
        let save_uri = format!("/messages/{message_id}/save");

        let (status, saved) = send(&app, Method::POST, &save_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["message_id"], message_id.as_str());
        assert!(saved["created_at"].is_string());

        let (status, body) = send(&app, Method::POST, &save_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "message already saved");

        let (status, list) = send(&app, Method::GET, "/saved", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["body"], "remember this");

        for _ in 0..2 {
            let (status, _) = send(&app, Method::DELETE, &save_uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let (_, list) = send(&app, Method::GET, "/saved", Some(&token), None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn saving_unknown_message_is_not_found() {
        let app = app();
        let token = register(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/messages/507f1f77bcf86cd799439011/save",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "message not found");
    }

    #[tokio::test]
    async fn saving_with_token_of_deleted_user_is_unauthorized() {
        let (app, state) = app_with_state();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let (_, msg) = send(
            &app,
            Method::POST,
            "/messages",
            Some(&alice),
            Some(json!({ "body": "hello" })),
        )
        .await;

        let bob_id = state.db.get_user_by_username("bob").unwrap().unwrap().id;
        state.db.delete_user(&bob_id).unwrap();

        let save_uri = format!("/messages/{}/save", msg["id"].as_str().unwrap());
        let (status, body) = send(&app, Method::POST, &save_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn username_length_counts_characters() {
        let app = app();

        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "éé", "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // 32 two-byte characters: 64 bytes, still within the limit
        let (status, _) = send(
            &app,
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": "é".repeat(32), "password": "password123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        register(&app, "ééé").await;
    }

    #[tokio::test]
    async fn only_author_deletes_and_saves_cascade() {
        let app = app();
        let alice = register(&app, "alice").await;
        let bob = register(&app, "bob").await;

        let (_, msg) = send(
            &app,
            Method::POST,
            "/messages",
            Some(&alice),
            Some(json!({ "body": "hello" })),
        )
        .await;
        let message_uri = format!("/messages/{}", msg["id"].as_str().unwrap());

        let (status, _) =
            send(&app, Method::POST, &format!("{message_uri}/save"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, Method::DELETE, &message_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::DELETE, &message_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = send(&app, Method::GET, "/saved?order=newest", Some(&bob), None).await;
        assert!(list.as_array().unwrap().is_empty());

        let (status, _) = send(&app, Method::DELETE, &message_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn messages_list_newest_first() {
        let app = app();
        let token = register(&app, "alice").await;
        for body in ["one", "two", "three"] {
            send(&app, Method::POST, "/messages", Some(&token), Some(json!({ "body": body }))).await;
        }

        let (status, list) = send(&app, Method::GET, "/messages?limit=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let bodies: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["body"].as_str().unwrap())
            .collect();
        assert_eq!(bodies, ["three", "two"]);

        let (_, me) = send(&app, Method::GET, "/users/me", Some(&token), None).await;
        assert_eq!(me["username"], "alice");
        assert_eq!(me["role"], "user");
    }
}
