// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, UniqueField, UserStore};
use crate::models::user::{NewUser, User, UserChanges};

/// Postgres-backed [`UserStore`]. Uniqueness is guarded by the
/// `users_email_key` and `users_nickname_key` constraints.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations in `./migrations`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, nickname, password, created_at, updated_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, nickname, password, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, nickname, password, created_at, updated_at
            FROM users
            WHERE nickname = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn is_taken(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<i64>,
    ) -> Result<bool, StoreError> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE {} = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
            field.as_str()
        );

        let taken = sqlx::query_scalar::<_, bool>(&sql)
            .bind(value)
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;

        Ok(taken)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, nickname, password)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, nickname, password, created_at, updated_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.nickname)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = StoreError::from(e);
            if let StoreError::Backend(msg) = &err {
                tracing::error!("Failed to insert user: {}", msg);
            }
            err
        })?;

        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        // A NULL password hash keeps the stored one.
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1,
                email = $2,
                nickname = $3,
                password = COALESCE($4, password),
                updated_at = now()
            WHERE id = $5
            RETURNING id, name, email, nickname, password, created_at, updated_at
            "#,
        )
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.nickname)
        .bind(changes.password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
