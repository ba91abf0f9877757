// src/service.rs

use std::sync::Arc;

use crate::{
    error::{AppError, FieldErrors},
    models::user::{NewUser, User, UserChanges, UserFields, UserInput},
    store::{UniqueField, UserStore},
    utils::hash::PasswordHasher,
};

/// Validation and persistence rules for the User resource.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.store.list().await?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<User, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_by_nickname(&self, nickname: &str) -> Result<User, AppError> {
        self.store
            .find_by_nickname(nickname)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    /// Validates `input` and inserts a new user.
    ///
    /// The password, when given, is hashed before it reaches the store.
    pub async fn create(&self, input: &UserInput) -> Result<User, AppError> {
        let (fields, mut errors) = input.validate();
        self.check_unique(&fields, None, &mut errors).await?;
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = match fields.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        let user = self
            .store
            .insert(NewUser {
                name: fields.name,
                email: fields.email,
                nickname: fields.nickname,
                password_hash,
            })
            .await?;

        tracing::info!("Created user {}", user.id);
        Ok(user)
    }

    /// Validates `input` and overwrites the user's fields with the trimmed values.
    ///
    /// Uniqueness ignores the user's own row. An absent or blank password
    /// keeps the stored hash.
    pub async fn update(&self, id: i64, input: &UserInput) -> Result<User, AppError> {
        self.get_by_id(id).await?;

        let (fields, mut errors) = input.validate_trimmed();
        self.check_unique(&fields, Some(id), &mut errors).await?;
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let password_hash = match fields.password.as_deref() {
            Some(password) => Some(self.hasher.hash(password)?),
            None => None,
        };

        let user = self
            .store
            .update(
                id,
                UserChanges {
                    name: fields.name,
                    email: fields.email,
                    nickname: fields.nickname,
                    password_hash,
                },
            )
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        tracing::info!("Updated user {}", user.id);
        Ok(user)
    }

    /// Pre-checks email and nickname against other rows.
    /// Fields that already failed a format rule are skipped.
    async fn check_unique(
        &self,
        fields: &UserFields,
        exclude: Option<i64>,
        errors: &mut FieldErrors,
    ) -> Result<(), AppError> {
        let candidates = [
            (UniqueField::Email, fields.email.as_deref()),
            (UniqueField::Nickname, fields.nickname.as_deref()),
        ];

        for (field, value) in candidates {
            let Some(value) = value else { continue };
            if errors.has(field.as_str()) {
                continue;
            }
            if self.store.is_taken(field, value, exclude).await? {
                errors.add(field.as_str(), field.taken_message());
            }
        }

        Ok(())
    }
}
