//! User queries and mutations

use async_graphql::{Context, ErrorExtensions, Object, SimpleObject, ID};

use crate::models::User;
use crate::schema::auth_context;
use crate::services::ContentService;

/// A user as exposed by the API. The password hash never crosses this
/// boundary.
#[derive(SimpleObject)]
pub struct UserNode {
    pub id: ID,
    pub email: String,
    pub name: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserNode {
    fn from(user: User) -> Self {
        Self {
            id: ID(user.id.to_string()),
            email: user.email,
            name: user.name,
            status: user.status,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// The authenticated caller's own profile.
    async fn current_user(&self, ctx: &Context<'_>) -> async_graphql::Result<UserNode> {
        let service = ctx.data::<ContentService>()?;
        let user = service
            .current_user(auth_context(ctx))
            .await
            .map_err(|e| e.extend())?;
        Ok(UserNode::from(user))
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    /// Overwrite the caller's status text.
    async fn update_status(
        &self,
        ctx: &Context<'_>,
        status: String,
    ) -> async_graphql::Result<UserNode> {
        let service = ctx.data::<ContentService>()?;
        let user = service
            .update_status(auth_context(ctx), &status)
            .await
            .map_err(|e| e.extend())?;
        Ok(UserNode::from(user))
    }
}
