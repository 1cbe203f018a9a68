/// User repository - handles all database operations for users
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Create a new user in the database
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, name, password_hash, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, email, name, password_hash, status, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(email.to_lowercase())
    .bind(name)
    .bind(password_hash)
    .bind("I am new!")
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find a user by email
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, name, password_hash, status, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Find a user by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, name, password_hash, status, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Overwrite a user's status text
pub async fn update_status(
    pool: &PgPool,
    user_id: Uuid,
    status: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET status = $2, updated_at = $3
        WHERE id = $1
        RETURNING id, email, name, password_hash, status, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(status)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await
}
