//! Authentication gate middleware
//!
//! Extracts a `Bearer <token>` payload from the Authorization header and
//! attaches an immutable [`AuthContext`] to the request. The gate never
//! rejects a request: a missing, malformed, or unverifiable token downgrades
//! to an anonymous context so public operations (register, login) share the
//! same pipeline as protected ones. Every protected operation raises the
//! 401-class error itself via [`AuthContext::require`].

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;
use crate::security::TokenCodec;

/// Per-request authentication context; never persisted, never mutated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthContext {
    user_id: Option<Uuid>,
}

impl AuthContext {
    pub fn authenticated(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    /// The caller's user id, or the 401-class error.
    pub fn require(&self) -> crate::error::Result<Uuid> {
        self.user_id
            .ok_or_else(|| AppError::Unauthorized("Not authenticated!".to_string()))
    }
}

impl FromRequest for AuthContext {
    type Error = actix_web::Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        let ctx = req
            .extensions()
            .get::<AuthContext>()
            .copied()
            .unwrap_or_default();
        ready(Ok(ctx))
    }
}

/// Authentication gate middleware
pub struct AuthGate {
    codec: TokenCodec,
}

impl AuthGate {
    pub fn new(codec: TokenCodec) -> Self {
        Self { codec }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service,
            codec: self.codec.clone(),
        }))
    }
}

pub struct AuthGateService<S> {
    service: S,
    codec: TokenCodec,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let ctx = match bearer_token(&req) {
            Some(token) => match self.codec.verify(token) {
                Ok(user_id) => AuthContext::authenticated(user_id),
                Err(_) => {
                    // Verification failure is a downgrade, not an error
                    tracing::debug!("bearer token failed verification; continuing anonymous");
                    AuthContext::anonymous()
                }
            },
            None => AuthContext::anonymous(),
        };

        req.extensions_mut().insert(ctx);

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res)
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpRequest, HttpResponse};

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", 3600)
    }

    async fn whoami(req: HttpRequest) -> HttpResponse {
        let ctx = req
            .extensions()
            .get::<AuthContext>()
            .copied()
            .unwrap_or_default();
        match ctx.user_id() {
            Some(id) => HttpResponse::Ok().body(id.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    #[actix_web::test]
    async fn test_valid_token_attaches_user_id() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthGate::new(codec()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = codec().issue(user_id, "test@example.com").unwrap();

        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_web::test]
    async fn test_missing_header_downgrades_to_anonymous() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthGate::new(codec()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/whoami").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = actix_test::TestRequest::get().uri("/whoami").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous".as_bytes());
    }

    #[actix_web::test]
    async fn test_invalid_token_downgrades_to_anonymous() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthGate::new(codec()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Bearer not.a.token"))
            .to_request();

        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous".as_bytes());
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_downgrades_to_anonymous() {
        let app = actix_test::init_service(
            App::new()
                .wrap(AuthGate::new(codec()))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_request();

        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "anonymous".as_bytes());
    }

    #[test]
    fn test_require_on_anonymous_is_unauthorized() {
        let err = AuthContext::anonymous().require().unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
