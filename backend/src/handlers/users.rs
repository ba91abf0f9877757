// src/handlers/users.rs

use std::collections::HashMap;

use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request, State},
    http::{StatusCode, header, request::Parts},
    response::IntoResponse,
};
use serde_json::json;

use crate::{error::AppError, models::user::UserInput, service::UserService};

/// Numeric `{id}` path segment; anything else is a 400.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub i64);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(id))
    }
}

/// Accepts form-encoded bodies and JSON objects. An empty body is an empty map.
impl<S> FromRequest<S> for UserInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(pairs) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return Ok(UserInput::from_form(pairs));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(UserInput::default());
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Lists every user.
pub async fn list_users(State(users): State<UserService>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(users.list().await?))
}

/// Retrieves a single user by ID.
pub async fn get_user(
    State(users): State<UserService>,
    UserId(id): UserId,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(users.get_by_id(id).await?))
}

/// Finds a user by exact nickname, wrapped under `user`.
pub async fn get_user_by_nickname(
    State(users): State<UserService>,
    Path(nickname): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = users.get_by_nickname(&nickname).await?;

    Ok(Json(json!({ "user": user })))
}

/// Creates a user.
///
/// Returns 201 Created with a confirmation message and the user (excluding password).
pub async fn create_user(
    State(users): State<UserService>,
    input: UserInput,
) -> Result<impl IntoResponse, AppError> {
    let user = users.create(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": user,
        })),
    ))
}

/// Updates a user's fields; the response excludes the password.
pub async fn update_user(
    State(users): State<UserService>,
    UserId(id): UserId,
    input: UserInput,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(users.update(id, &input).await?))
}
