// src/models/user.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use crate::error::FieldErrors;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    pub name: Option<String>,

    /// Unique email address.
    pub email: Option<String>,

    /// Unique handle, at most 30 characters.
    pub nickname: Option<String>,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Raw body of a create/update request, before any checks.
///
/// Every key is optional; `null` counts as absent and unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct UserInput(Map<String, Value>);

const FIELDS: [&str; 4] = ["name", "email", "nickname", "password"];

impl UserInput {
    /// Form bodies only carry strings, so they always pass the type checks.
    pub fn from_form(pairs: HashMap<String, String>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect(),
        )
    }

    /// Runs the type, format and length rules on the values as sent.
    ///
    /// Returns the fields that are strings alongside every rule failure;
    /// uniqueness is checked later against the store.
    pub fn validate(&self) -> (UserFields, FieldErrors) {
        self.check(false)
    }

    /// Like [`UserInput::validate`], but trims the string fields before the
    /// format and length rules run. Values left blank become absent.
    pub fn validate_trimmed(&self) -> (UserFields, FieldErrors) {
        self.check(true)
    }

    fn check(&self, trim: bool) -> (UserFields, FieldErrors) {
        let mut errors = FieldErrors::new();
        let mut strings = FIELDS.map(|field| match self.0.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                errors.add(field, format!("The {} field must be a string.", field));
                None
            }
        });

        let mut fields = UserFields {
            name: strings[0].take(),
            email: strings[1].take(),
            nickname: strings[2].take(),
            password: strings[3].take(),
        };
        if trim {
            fields = fields.trimmed();
        }

        if let Err(rule_errors) = Validate::validate(&fields) {
            errors.merge(field_errors(rule_errors));
        }

        (fields, errors)
    }
}

/// Type-checked request fields with their format and length rules.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct UserFields {
    pub name: Option<String>,

    #[validate(email(message = "The email field must be a valid email address."))]
    pub email: Option<String>,

    #[validate(length(
        max = 30,
        message = "The nickname field must not be greater than 30 characters."
    ))]
    pub nickname: Option<String>,

    #[validate(length(min = 6, message = "The password field must be at least 6 characters."))]
    pub password: Option<String>,
}

impl UserFields {
    /// Strips surrounding whitespace; values left empty become absent.
    pub fn trimmed(self) -> Self {
        fn trim(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            name: trim(self.name),
            email: trim(self.email),
            nickname: trim(self.nickname),
            password: trim(self.password),
        }
    }
}

/// Row values for an insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub password_hash: Option<String>,
}

/// Overwrite set for an update.
/// `name`, `email` and `nickname` replace the stored values (None clears them);
/// a `None` password hash keeps the stored one.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub password_hash: Option<String>,
}

fn field_errors(errors: ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, failures) in errors.field_errors() {
        for failure in failures {
            let message = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("The {} field is invalid.", field));
            out.add(&field, message);
        }
    }
    out
}
