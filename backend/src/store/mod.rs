// src/store/mod.rs

use std::fmt;

use async_trait::async_trait;

use crate::models::user::{NewUser, User, UserChanges};

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Columns carrying a unique constraint on the users table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Nickname,
}

impl UniqueField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniqueField::Email => "email",
            UniqueField::Nickname => "nickname",
        }
    }

    /// Resolves a Postgres constraint name from the users migration.
    pub fn from_constraint(name: &str) -> Option<Self> {
        match name {
            "users_email_key" => Some(UniqueField::Email),
            "users_nickname_key" => Some(UniqueField::Nickname),
            _ => None,
        }
    }

    pub fn taken_message(&self) -> String {
        format!("The {} has already been taken.", self.as_str())
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// A write collided with an existing email or nickname.
    UniqueViolation(UniqueField),

    /// Any other failure reported by the backend.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UniqueViolation(field) => {
                write!(f, "unique constraint violated on {}", field.as_str())
            }
            StoreError::Backend(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // Postgres error code for unique violation is 23505
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                if let Some(field) = db_err.constraint().and_then(UniqueField::from_constraint) {
                    return StoreError::UniqueViolation(field);
                }
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Persistence port for User records.
///
/// Implementations must enforce email/nickname uniqueness atomically with the
/// write and report collisions as [`StoreError::UniqueViolation`].
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users ordered by id.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// First user (lowest id) whose nickname equals `nickname` exactly.
    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError>;

    /// Whether another row already holds `value` in `field`, ignoring `exclude`.
    async fn is_taken(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<i64>,
    ) -> Result<bool, StoreError>;

    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Applies `changes` to row `id`; `Ok(None)` when the row does not exist.
    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_resolve_to_fields() {
        assert_eq!(
            UniqueField::from_constraint("users_email_key"),
            Some(UniqueField::Email)
        );
        assert_eq!(
            UniqueField::from_constraint("users_nickname_key"),
            Some(UniqueField::Nickname)
        );
        assert_eq!(UniqueField::from_constraint("users_pkey"), None);
    }

    #[test]
    fn non_database_errors_are_backend_failures() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
