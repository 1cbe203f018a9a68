//! Health check endpoint

use actix_web::{get, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

#[get("/health")]
pub async fn health_check(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "healthy",
            "service": "content-api",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unhealthy",
                "service": "content-api",
            }))
        }
    }
}
