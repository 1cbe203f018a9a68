/// Content API Library
///
/// Backend for the Chronicle blogging platform: users register, authenticate,
/// publish image-illustrated posts, and browse a paginated feed.
///
/// # Modules
///
/// - `schema`: GraphQL query/mutation surface
/// - `handlers`: REST endpoints (image upload, health)
/// - `services`: Business logic layer and feed pagination
/// - `db`: Database access layer and repositories
/// - `storage`: Image object storage (S3 or local disk)
/// - `security`: Token signing/verification and password hashing
/// - `middleware`: HTTP middleware for authentication
/// - `models`: Data structures for users and posts
/// - `validators`: Input validation
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod schema;
pub mod security;
pub mod services;
pub mod storage;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};
