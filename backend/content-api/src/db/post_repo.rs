/// Post repository - handles all database operations for posts
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::Post;

/// Create a new post owned by `user_id`
pub async fn create_post(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    content: &str,
    image_url: Option<&str>,
) -> Result<Post, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, title, content, image_url, user_id, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, content, image_url, user_id, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(content)
    .bind(image_url)
    .bind(user_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find a post by ID
pub async fn find_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, image_url, user_id, created_at, updated_at
        FROM posts
        WHERE id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// One feed page, newest-first; ties on created_at break by id for
/// deterministic pagination across pages.
pub async fn list_page(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, image_url, user_id, created_at, updated_at
        FROM posts
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Count all posts; recomputed on every feed request
pub async fn count_posts(pool: &PgPool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM posts")
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

/// Update a post's fields, refreshing the modification timestamp.
/// The owner is never touched here; ownership is checked by the caller.
pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    title: &str,
    content: &str,
    image_url: Option<&str>,
) -> Result<Post, sqlx::Error> {
    sqlx::query_as::<_, Post>(
        r#"
        UPDATE posts
        SET title = $2, content = $3, image_url = $4, updated_at = $5
        WHERE id = $1
        RETURNING id, title, content, image_url, user_id, created_at, updated_at
        "#,
    )
    .bind(post_id)
    .bind(title)
    .bind(content)
    .bind(image_url)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Delete a post; returns whether a row was removed
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
