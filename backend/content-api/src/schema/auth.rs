//! Registration and login mutations

use async_graphql::{Context, ErrorExtensions, InputObject, Object, SimpleObject, ID};

use crate::schema::user::UserNode;
use crate::services::ContentService;

#[derive(InputObject)]
pub struct RegisterInput {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// A successful login: the bearer token and the authenticated user's id.
#[derive(SimpleObject)]
pub struct AuthPayload {
    pub token: String,
    pub user_id: ID,
}

#[derive(Default)]
pub struct AuthMutation;

#[Object]
impl AuthMutation {
    /// Create a new account. Open to anonymous callers.
    async fn register(
        &self,
        ctx: &Context<'_>,
        input: RegisterInput,
    ) -> async_graphql::Result<UserNode> {
        let service = ctx.data::<ContentService>()?;
        let user = service
            .register(&input.email, &input.name, &input.password)
            .await
            .map_err(|e| e.extend())?;
        Ok(UserNode::from(user))
    }

    /// Exchange credentials for a bearer token.
    async fn login(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> async_graphql::Result<AuthPayload> {
        let service = ctx.data::<ContentService>()?;
        let session = service
            .login(&email, &password)
            .await
            .map_err(|e| e.extend())?;
        Ok(AuthPayload {
            token: session.token,
            user_id: ID(session.user_id.to_string()),
        })
    }
}
