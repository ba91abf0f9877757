// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::users, state::AppState};

/// Assembles the main application router.
///
/// * Mounts the user routes under `/api`.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (user service, config).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    // Static segments win over `{id}`, so `nickname/...` and `store` never hit the id routes.
    let user_routes = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/", get(users::list_users))
        .route("/users/store", post(users::create_user))
        .route("/users/nickname/{nickname}", get(users::get_user_by_nickname))
        .route("/users/{id}", get(users::get_user).put(users::update_user));

    Router::new()
        .nest("/api", user_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::Config, error::AppError, store::MemoryUserStore, utils::hash::PasswordHasher,
    };

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, plaintext: &str) -> Result<String, AppError> {
            Ok(format!("hashed:{plaintext}"))
        }
    }

    fn app() -> Router {
        let state = AppState::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(PlainHasher),
            Config::default(),
        );
        create_router(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn form_encoded_create_is_accepted() {
        let app = app();
        let request = Request::post("/api/users/store")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(
                "name=Shoaib&email=shoaib%40test.com&nickname=bond&password=hello%23world12",
            ))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created successfully");
        assert_eq!(body["user"]["email"], "shoaib@test.com");
        assert!(body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_bad_request() {
        let app = app();
        let request = Request::get("/api/users/abc").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app();
        let request = Request::post("/api/users/store")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn json_array_body_is_a_bad_request() {
        let app = app();
        let request = Request::post("/api/users/store")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("[1, 2]"))
            .unwrap();

        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn trailing_slash_lists_users() {
        let app = app();
        let request = Request::get("/api/users/").body(Body::empty()).unwrap();

        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(vec![]));
    }
}
