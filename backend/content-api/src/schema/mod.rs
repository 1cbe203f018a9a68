//! GraphQL schema
//!
//! The query/mutation surface over [`ContentService`]. Resolvers stay thin:
//! they parse ids, pull the per-request [`AuthContext`], delegate, and map
//! domain errors into the GraphQL error envelope.

use async_graphql::{Context, EmptySubscription, MergedObject, Schema};

use crate::middleware::AuthContext;
use crate::services::ContentService;

pub mod auth;
pub mod content;
pub mod user;

pub use auth::{AuthMutation, AuthPayload};
pub use content::{ContentMutation, ContentQuery, PostNode, PostPage};
pub use user::{UserMutation, UserNode, UserQuery};

#[derive(MergedObject, Default)]
pub struct QueryRoot(ContentQuery, UserQuery);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthMutation, ContentMutation, UserMutation);

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(service: ContentService) -> AppSchema {
    Schema::build(
        QueryRoot::default(),
        MutationRoot::default(),
        EmptySubscription,
    )
    .data(service)
    .finish()
}

/// The caller's authentication context, anonymous when none was attached.
pub(crate) fn auth_context(ctx: &Context<'_>) -> AuthContext {
    ctx.data_opt::<AuthContext>().copied().unwrap_or_default()
}
