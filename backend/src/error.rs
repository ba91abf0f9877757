// src/error.rs

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::store::StoreError;

/// Per-field validation messages, serialized as `{field: [messages...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error set holding a single message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends every message of `other`, keeping the messages already present.
    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request (unparseable body or path)
    BadRequest(String),

    // 400 Bad Request with per-field messages
    Validation(FieldErrors),

    // 404 Not Found
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with the matching HTTP status code.
///
/// Validation failures carry `{"errors": {...}}`, everything else `{"message": ...}`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors })))
                    .into_response();
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// A store-level unique violation is a validation failure on that field,
/// anything else is a server error.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(field) => {
                tracing::warn!("Unique constraint rejected write on {}", field.as_str());
                AppError::Validation(FieldErrors::single(
                    field.as_str(),
                    field.taken_message(),
                ))
            }
            StoreError::Backend(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UniqueField;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_render_under_errors_key() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email field must be a valid email address.");
        errors.add("password", "The password field must be at least 6 characters.");

        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(
            body["errors"]["email"][0],
            "The email field must be a valid email address."
        );
        assert_eq!(body["errors"]["password"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn not_found_renders_message() {
        let response = AppError::NotFound("User not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({ "message": "User not found" }));
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response =
            AppError::InternalServerError("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "Internal Server Error");
    }

    #[test]
    fn unique_violation_maps_to_field_error() {
        let err = AppError::from(StoreError::UniqueViolation(UniqueField::Nickname));
        match err {
            AppError::Validation(errors) => {
                assert_eq!(
                    errors.get("nickname"),
                    Some(&["The nickname has already been taken.".to_string()][..])
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn merge_keeps_existing_messages() {
        let mut errors = FieldErrors::single("email", "first");
        errors.merge(FieldErrors::single("email", "second"));
        assert_eq!(errors.get("email").unwrap(), ["first", "second"]);
    }
}
