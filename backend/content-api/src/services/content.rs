//! Content service - operation layer behind the API surface
//!
//! Owns all validation, ownership, and image lifecycle rules. Handlers and
//! resolvers stay thin; everything that decides whether an operation may
//! happen lives here.

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthContext;
use crate::models::{Post, User};
use crate::security::{password, TokenCodec};
use crate::services::pagination::{page_window, POSTS_PER_PAGE};
use crate::storage::ImageStore;
use crate::validators;

/// A signed session: the bearer token and the user it identifies.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
}

/// One feed page with its pagination metadata.
#[derive(Debug, Clone)]
pub struct PostFeed {
    pub posts: Vec<Post>,
    pub total_posts: i64,
    pub last_page: i64,
}

#[derive(Clone)]
pub struct ContentService {
    pool: PgPool,
    store: Arc<dyn ImageStore>,
    codec: TokenCodec,
}

impl ContentService {
    pub fn new(pool: PgPool, store: Arc<dyn ImageStore>, codec: TokenCodec) -> Self {
        Self { pool, store, codec }
    }

    /// Register a new account. The email is unique case-insensitively;
    /// the plaintext password never leaves this function.
    pub async fn register(&self, email: &str, name: &str, password_plain: &str) -> Result<User> {
        let errors = validators::registration_errors(email, name, password_plain);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if user_repo::find_by_email(&self.pool, email).await?.is_some() {
            return Err(AppError::Conflict("User exists already!".to_string()));
        }

        let hash = password::hash_password(password_plain)?;
        // A concurrent registration can slip past the lookup above; the
        // unique index on email is the authoritative check.
        let user = user_repo::create_user(&self.pool, email.trim(), name.trim(), &hash)
            .await
            .map_err(map_duplicate_email)?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Verify credentials and issue a bearer token. Unknown email and
    /// wrong password fail identically so the response never reveals
    /// whether an account exists.
    pub async fn login(&self, email: &str, password_plain: &str) -> Result<Session> {
        let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());

        let user = user_repo::find_by_email(&self.pool, email)
            .await?
            .ok_or_else(invalid)?;

        if !password::verify_password(password_plain, &user.password_hash)? {
            return Err(invalid());
        }

        let token = self.codec.issue(user.id, &user.email)?;
        Ok(Session {
            token,
            user_id: user.id,
        })
    }

    pub async fn create_post(
        &self,
        ctx: AuthContext,
        title: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<Post> {
        let user_id = ctx.require()?;

        let errors = validators::post_input_errors(title, content);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let post =
            post_repo::create_post(&self.pool, user_id, title.trim(), content.trim(), image_url)
                .await?;
        tracing::info!(post_id = %post.id, user_id = %user_id, "post created");
        Ok(post)
    }

    /// Fetch one post. Requires authentication like every read here.
    pub async fn post(&self, ctx: AuthContext, post_id: Uuid) -> Result<Post> {
        ctx.require()?;
        post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No post found!".to_string()))
    }

    /// One page of the feed, newest first, with total and last-page metadata.
    pub async fn posts(&self, ctx: AuthContext, page: Option<i64>) -> Result<PostFeed> {
        ctx.require()?;

        let total_posts = post_repo::count_posts(&self.pool).await?;
        let window = page_window(total_posts, POSTS_PER_PAGE, page.unwrap_or(1));
        let posts = post_repo::list_page(&self.pool, window.limit, window.skip).await?;

        Ok(PostFeed {
            posts,
            total_posts,
            last_page: window.last_page,
        })
    }

    /// Update a post's title, content, and image. Only the owner may
    /// update; ownership itself never changes. An absent image reference
    /// keeps the current one; when the image is replaced the superseded
    /// object is retired only after the new row is persisted.
    pub async fn update_post(
        &self,
        ctx: AuthContext,
        post_id: Uuid,
        title: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<Post> {
        let user_id = ctx.require()?;

        let errors = validators::post_input_errors(title, content);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let existing = post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No post found!".to_string()))?;

        let plan = plan_post_update(&existing, user_id, image_url)?;

        let updated = post_repo::update_post(
            &self.pool,
            post_id,
            title.trim(),
            content.trim(),
            plan.image_url,
        )
        .await?;

        // The old image is only orphaned once the new row is durable.
        if let Some(old) = plan.retire {
            self.retire_image(old).await;
        }

        Ok(updated)
    }

    /// Delete a post and best-effort retire its image.
    pub async fn delete_post(&self, ctx: AuthContext, post_id: Uuid) -> Result<()> {
        let user_id = ctx.require()?;

        let existing = post_repo::find_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No post found!".to_string()))?;

        authorize_owner(&existing, user_id)?;

        post_repo::delete_post(&self.pool, post_id).await?;

        if let Some(image) = existing.image_url.as_deref() {
            self.retire_image(image).await;
        }

        tracing::info!(post_id = %post_id, user_id = %user_id, "post deleted");
        Ok(())
    }

    pub async fn current_user(&self, ctx: AuthContext) -> Result<User> {
        let user_id = ctx.require()?;
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No user found!".to_string()))
    }

    pub async fn update_status(&self, ctx: AuthContext, status: &str) -> Result<User> {
        let user_id = ctx.require()?;
        user_repo::update_status(&self.pool, user_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("No user found!".to_string()))
    }

    /// Resolve the owning user of a post.
    pub async fn creator(&self, user_id: Uuid) -> Result<User> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No user found!".to_string()))
    }

    /// Persist an uploaded image and return its public URL. The new
    /// object is written before the superseded one is retired, so a
    /// failed upload never loses the old image.
    pub async fn store_image(
        &self,
        ctx: AuthContext,
        bytes: Vec<u8>,
        content_type: &str,
        original_name: &str,
        old_reference: Option<&str>,
    ) -> Result<String> {
        ctx.require()?;

        let url = self.store.upload(bytes, content_type, original_name).await?;

        if let Some(old) = old_reference {
            self.retire_image(old).await;
        }

        Ok(url)
    }

    /// Best-effort delete of a stored image. Failure is logged and
    /// swallowed: an orphaned object must never fail the user-visible
    /// operation that already succeeded.
    async fn retire_image(&self, reference: &str) {
        if let Err(e) = self.store.delete(reference).await {
            tracing::warn!(%reference, error = %e, "failed to delete stored image");
        }
    }
}

/// A unique violation on insert is a duplicate registration, not a
/// server fault.
fn map_duplicate_email(err: sqlx::Error) -> AppError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => {
            AppError::Conflict("User exists already!".to_string())
        }
        _ => err.into(),
    }
}

/// What an update will write and which stored object it supersedes.
#[derive(Debug, PartialEq, Eq)]
struct UpdatePlan<'a> {
    image_url: Option<&'a str>,
    retire: Option<&'a str>,
}

/// Owner check shared by every mutating post operation. Runs before any
/// write, so a rejected caller leaves the row and its image untouched.
fn authorize_owner(existing: &Post, caller: Uuid) -> Result<()> {
    if existing.user_id != caller {
        return Err(AppError::Forbidden("Not authorized!".to_string()));
    }
    Ok(())
}

/// Decide what an update persists. An absent image reference means "keep
/// the current image", never "clear it"; only an actual replacement marks
/// the old object for retirement.
fn plan_post_update<'a>(
    existing: &'a Post,
    caller: Uuid,
    requested_image: Option<&'a str>,
) -> Result<UpdatePlan<'a>> {
    authorize_owner(existing, caller)?;

    let image_url = requested_image.or(existing.image_url.as_deref());
    let retire = match (existing.image_url.as_deref(), image_url) {
        (Some(old), Some(new)) if old != new => Some(old),
        _ => None,
    };

    Ok(UpdatePlan { image_url, retire })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalImageStore;
    use sqlx::postgres::PgPoolOptions;

    // Lazy pool: these tests exercise the checks that run before any
    // query, so no database is ever contacted.
    fn service() -> ContentService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/unreachable")
            .expect("lazy pool");
        let store: Arc<dyn ImageStore> = Arc::new(LocalImageStore::with_root(
            std::env::temp_dir().join("content-api-service-tests"),
            "http://localhost/media",
        ));
        ContentService::new(pool, store, TokenCodec::new("test-secret", 3600))
    }

    fn assert_unauthorized(err: AppError) {
        match err {
            AppError::Unauthorized(msg) => assert_eq!(msg, "Not authenticated!"),
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_protected_operations_reject_anonymous_before_any_write() {
        let svc = service();
        let anon = AuthContext::anonymous();
        let id = Uuid::new_v4();

        assert_unauthorized(svc.create_post(anon, "Hello World", "Some content", None).await.unwrap_err());
        assert_unauthorized(svc.update_post(anon, id, "Hello World", "Some content", None).await.unwrap_err());
        assert_unauthorized(svc.delete_post(anon, id).await.unwrap_err());
        assert_unauthorized(svc.post(anon, id).await.unwrap_err());
        assert_unauthorized(svc.posts(anon, Some(1)).await.unwrap_err());
        assert_unauthorized(svc.current_user(anon).await.unwrap_err());
        assert_unauthorized(svc.update_status(anon, "hi").await.unwrap_err());
        assert_unauthorized(
            svc.store_image(anon, vec![1, 2, 3], "image/png", "a.png", None)
                .await
                .unwrap_err(),
        );
    }

    #[tokio::test]
    async fn test_create_post_validates_before_persisting() {
        let svc = service();
        let ctx = AuthContext::authenticated(Uuid::new_v4());

        let err = svc.create_post(ctx, "Hi", "ok", None).await.unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].field, "title");
                assert_eq!(fields[1].field, "content");
            }
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_validates_before_lookup() {
        let svc = service();

        let err = svc.register("not-an-email", "", "abc").await.unwrap_err();
        match err {
            AppError::Validation(fields) => assert_eq!(fields.len(), 3),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_non_unique_insert_errors_stay_database_errors() {
        // Only unique violations become Conflict; everything else keeps
        // its 500-class mapping
        let err = map_duplicate_email(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(_)));
        let err = map_duplicate_email(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Database(_)));
    }

    fn post_owned_by(user_id: Uuid, image_url: Option<&str>) -> Post {
        let now = chrono::Utc::now();
        Post {
            id: Uuid::new_v4(),
            title: "Hello World".to_string(),
            content: "Some content".to_string(),
            image_url: image_url.map(str::to_string),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_non_owner_update_is_forbidden() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner, Some("http://media/uploads/1-a.png"));

        let err = plan_post_update(&post, Uuid::new_v4(), None).unwrap_err();
        match err {
            AppError::Forbidden(msg) => assert_eq!(msg, "Not authorized!"),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_non_owner_delete_is_forbidden() {
        let post = post_owned_by(Uuid::new_v4(), None);
        let err = authorize_owner(&post, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(authorize_owner(&post, post.user_id).is_ok());
    }

    #[test]
    fn test_update_without_image_keeps_current_image() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner, Some("http://media/uploads/1-a.png"));

        let plan = plan_post_update(&post, owner, None).unwrap();
        assert_eq!(plan.image_url, Some("http://media/uploads/1-a.png"));
        assert_eq!(plan.retire, None);
    }

    #[test]
    fn test_update_with_new_image_retires_old_one() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner, Some("http://media/uploads/1-a.png"));

        let plan =
            plan_post_update(&post, owner, Some("http://media/uploads/2-b.png")).unwrap();
        assert_eq!(plan.image_url, Some("http://media/uploads/2-b.png"));
        assert_eq!(plan.retire, Some("http://media/uploads/1-a.png"));
    }

    #[test]
    fn test_update_resending_same_image_retires_nothing() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner, Some("http://media/uploads/1-a.png"));

        let plan =
            plan_post_update(&post, owner, Some("http://media/uploads/1-a.png")).unwrap();
        assert_eq!(plan.retire, None);
    }

    #[test]
    fn test_update_on_imageless_post_sets_first_image() {
        let owner = Uuid::new_v4();
        let post = post_owned_by(owner, None);

        let plan =
            plan_post_update(&post, owner, Some("http://media/uploads/1-a.png")).unwrap();
        assert_eq!(plan.image_url, Some("http://media/uploads/1-a.png"));
        assert_eq!(plan.retire, None);

        let plan = plan_post_update(&post, owner, None).unwrap();
        assert_eq!(plan.image_url, None);
        assert_eq!(plan.retire, None);
    }
}
