// tests/postgres_tests.rs
//
// These run against a live database: DATABASE_URL=... cargo test -- --ignored

use sqlx::postgres::PgPoolOptions;
use user_service::{
    models::user::{NewUser, UserChanges},
    store::{PgUserStore, StoreError, UniqueField, UserStore},
};

async fn store() -> PgUserStore {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    let store = PgUserStore::new(pool);
    store.migrate().await.expect("Failed to migrate database");
    store
}

fn new_user() -> NewUser {
    let tag = &uuid::Uuid::new_v4().to_string()[..8];
    NewUser {
        name: Some("Shoaib".to_string()),
        email: Some(format!("{}@pg.test", tag)),
        nickname: Some(format!("pg_{}", tag)),
        password_hash: Some("hash".to_string()),
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn insert_and_find() {
    let store = store().await;
    let user = store.insert(new_user()).await.unwrap();

    let by_id = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(by_id, user);

    let nickname = user.nickname.clone().unwrap();
    let by_nickname = store.find_by_nickname(&nickname).await.unwrap().unwrap();
    assert_eq!(by_nickname.id, user.id);

    assert!(store.list().await.unwrap().iter().any(|u| u.id == user.id));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn constraint_violations_name_the_field() {
    let store = store().await;
    let user = store.insert(new_user()).await.unwrap();

    let mut duplicate = new_user();
    duplicate.email = user.email.clone();
    let err = store.insert(duplicate).await.unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(UniqueField::Email)));

    let mut duplicate = new_user();
    duplicate.nickname = user.nickname.clone();
    let err = store.insert(duplicate).await.unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation(UniqueField::Nickname)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn update_keeps_hash_and_excludes_own_row() {
    let store = store().await;
    let user = store.insert(new_user()).await.unwrap();
    let email = user.email.clone().unwrap();

    assert!(store.is_taken(UniqueField::Email, &email, None).await.unwrap());
    assert!(!store.is_taken(UniqueField::Email, &email, Some(user.id)).await.unwrap());

    let updated = store
        .update(
            user.id,
            UserChanges {
                name: Some("James".to_string()),
                email: user.email.clone(),
                nickname: user.nickname.clone(),
                password_hash: None,
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.name.as_deref(), Some("James"));
    assert_eq!(updated.password.as_deref(), Some("hash"));
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn update_of_missing_row_is_none() {
    let store = store().await;
    let changes = UserChanges {
        name: None,
        email: None,
        nickname: None,
        password_hash: None,
    };
    assert!(store.update(i64::MAX, changes).await.unwrap().is_none());
}
