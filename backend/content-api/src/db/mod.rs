/// Database access layer
///
/// Repository functions over a shared PgPool; the pool is created once at
/// startup and reused for the process lifetime.
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};

pub mod post_repo;
pub mod user_repo;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the connection pool and run pending migrations.
pub async fn init_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<Pool<Postgres>, crate::AppError> {
    let pool: PgPool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    MIGRATOR.run(&pool).await?;
    Ok(pool)
}
