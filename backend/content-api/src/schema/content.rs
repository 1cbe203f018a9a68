//! Post queries and mutations, plus the paginated feed

use async_graphql::{
    ComplexObject, Context, ErrorExtensions, InputObject, Object, SimpleObject, ID,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Post;
use crate::schema::user::UserNode;
use crate::schema::auth_context;
use crate::services::ContentService;

#[derive(SimpleObject)]
#[graphql(complex)]
pub struct PostNode {
    pub id: ID,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[graphql(skip)]
    user_id: Uuid,
}

#[ComplexObject]
impl PostNode {
    /// The user who owns this post.
    async fn creator(&self, ctx: &Context<'_>) -> async_graphql::Result<UserNode> {
        let service = ctx.data::<ContentService>()?;
        let user = service.creator(self.user_id).await.map_err(|e| e.extend())?;
        Ok(UserNode::from(user))
    }
}

impl From<Post> for PostNode {
    fn from(post: Post) -> Self {
        Self {
            id: ID(post.id.to_string()),
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            user_id: post.user_id,
        }
    }
}

/// One feed page.
#[derive(SimpleObject)]
pub struct PostPage {
    pub posts: Vec<PostNode>,
    pub total_posts: i64,
    pub last_page: i64,
}

#[derive(InputObject)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

fn parse_post_id(id: &ID) -> Result<Uuid, AppError> {
    // An unparseable id matches nothing, same as an unknown one
    Uuid::parse_str(id.as_str()).map_err(|_| AppError::NotFound("No post found!".to_string()))
}

#[derive(Default)]
pub struct ContentQuery;

#[Object]
impl ContentQuery {
    /// A single post by id.
    async fn post(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<PostNode> {
        let service = ctx.data::<ContentService>()?;
        let post_id = parse_post_id(&id).map_err(|e| e.extend())?;
        let post = service
            .post(auth_context(ctx), post_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(PostNode::from(post))
    }

    /// The feed, newest first, two posts per page.
    async fn posts(&self, ctx: &Context<'_>, page: Option<i64>) -> async_graphql::Result<PostPage> {
        let service = ctx.data::<ContentService>()?;
        let feed = service
            .posts(auth_context(ctx), page)
            .await
            .map_err(|e| e.extend())?;
        Ok(PostPage {
            posts: feed.posts.into_iter().map(PostNode::from).collect(),
            total_posts: feed.total_posts,
            last_page: feed.last_page,
        })
    }
}

#[derive(Default)]
pub struct ContentMutation;

#[Object]
impl ContentMutation {
    async fn create_post(
        &self,
        ctx: &Context<'_>,
        input: PostInput,
    ) -> async_graphql::Result<PostNode> {
        let service = ctx.data::<ContentService>()?;
        let post = service
            .create_post(
                auth_context(ctx),
                &input.title,
                &input.content,
                input.image_url.as_deref(),
            )
            .await
            .map_err(|e| e.extend())?;
        Ok(PostNode::from(post))
    }

    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: PostInput,
    ) -> async_graphql::Result<PostNode> {
        let service = ctx.data::<ContentService>()?;
        let post_id = parse_post_id(&id).map_err(|e| e.extend())?;
        let post = service
            .update_post(
                auth_context(ctx),
                post_id,
                &input.title,
                &input.content,
                input.image_url.as_deref(),
            )
            .await
            .map_err(|e| e.extend())?;
        Ok(PostNode::from(post))
    }

    /// Delete a post; returns true once the post is gone.
    async fn delete_post(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let service = ctx.data::<ContentService>()?;
        let post_id = parse_post_id(&id).map_err(|e| e.extend())?;
        service
            .delete_post(auth_context(ctx), post_id)
            .await
            .map_err(|e| e.extend())?;
        Ok(true)
    }
}
