// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{StoreError, UniqueField, UserStore};
use crate::models::user::{NewUser, User, UserChanges};

/// In-process [`UserStore`] used by tests and database-less runs.
///
/// Writes hold the table lock for the whole check-and-write, so unique
/// constraints behave like the Postgres ones.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, User>,
    last_id: i64,
}

impl Table {
    fn holds(&self, field: UniqueField, value: &str, exclude: Option<i64>) -> bool {
        self.rows
            .values()
            .filter(|row| Some(row.id) != exclude)
            .any(|row| match field {
                UniqueField::Email => row.email.as_deref() == Some(value),
                UniqueField::Nickname => row.nickname.as_deref() == Some(value),
            })
    }

    fn conflict(
        &self,
        email: Option<&str>,
        nickname: Option<&str>,
        exclude: Option<i64>,
    ) -> Option<UniqueField> {
        if email.is_some_and(|v| self.holds(UniqueField::Email, v, exclude)) {
            return Some(UniqueField::Email);
        }
        if nickname.is_some_and(|v| self.holds(UniqueField::Nickname, v, exclude)) {
            return Some(UniqueField::Nickname);
        }
        None
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|row| row.nickname.as_deref() == Some(nickname))
            .cloned())
    }

    async fn is_taken(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<i64>,
    ) -> Result<bool, StoreError> {
        Ok(self.table.read().await.holds(field, value, exclude))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;

        if let Some(field) = table.conflict(user.email.as_deref(), user.nickname.as_deref(), None) {
            return Err(StoreError::UniqueViolation(field));
        }

        table.last_id += 1;
        let now = Utc::now();
        let row = User {
            id: table.last_id,
            name: user.name,
            email: user.email,
            nickname: user.nickname,
            password: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(row.id, row.clone());

        Ok(row)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut table = self.table.write().await;

        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if let Some(field) = table.conflict(
            changes.email.as_deref(),
            changes.nickname.as_deref(),
            Some(id),
        ) {
            return Err(StoreError::UniqueViolation(field));
        }

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.name = changes.name;
        row.email = changes.email;
        row.nickname = changes.nickname;
        if let Some(hash) = changes.password_hash {
            row.password = Some(hash);
        }
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }
}
