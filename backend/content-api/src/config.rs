/// Configuration management for the content API
///
/// Loads configuration from environment variables with development-friendly
/// defaults; production-unsafe values fail startup.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing configuration
    pub auth: AuthConfig,
    /// Image storage configuration
    pub storage: StorageConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Token signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Token validity window in seconds
    pub token_ttl_secs: i64,
}

/// Which object store backs image uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

/// Image storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Custom S3 endpoint (MinIO, localstack); empty uses AWS
    pub endpoint: Option<String>,
    /// Explicit credentials; absent falls back to the ambient AWS chain
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base URL prepended to object keys when building public references
    pub public_base_url: Option<String>,
    /// Directory for the local-disk backend
    pub local_dir: String,
}

const DEFAULT_JWT_SECRET: &str = "dev-only-secret";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("CONTENT_API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CONTENT_API_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/chronicle".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            auth: {
                let jwt_secret = std::env::var("JWT_SECRET")
                    .unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string());
                if production && jwt_secret == DEFAULT_JWT_SECRET {
                    return Err(
                        "JWT_SECRET must be set to a non-default value in production".to_string()
                    );
                }

                AuthConfig {
                    jwt_secret,
                    token_ttl_secs: std::env::var("TOKEN_TTL_SECS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(3600),
                }
            },
            storage: {
                let backend = match std::env::var("STORAGE_BACKEND")
                    .unwrap_or_else(|_| "local".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "s3" => StorageBackend::S3,
                    "local" => StorageBackend::Local,
                    other => return Err(format!("Unknown STORAGE_BACKEND '{}'", other)),
                };

                StorageConfig {
                    backend,
                    bucket: std::env::var("AWS_BUCKET_NAME")
                        .unwrap_or_else(|_| "chronicle-media".to_string()),
                    region: std::env::var("AWS_REGION")
                        .unwrap_or_else(|_| "us-east-1".to_string()),
                    endpoint: std::env::var("S3_ENDPOINT").ok().filter(|e| !e.trim().is_empty()),
                    access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
                    secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
                    public_base_url: std::env::var("MEDIA_PUBLIC_BASE_URL")
                        .ok()
                        .filter(|e| !e.trim().is_empty()),
                    local_dir: std::env::var("MEDIA_LOCAL_DIR")
                        .unwrap_or_else(|_| "media".to_string()),
                }
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Single test because env vars are process-global and tests run in parallel
    #[test]
    fn test_from_env_defaults_and_production_guards() {
        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.storage.backend, StorageBackend::Local);

        env::set_var("APP_ENV", "production");
        env::set_var("CORS_ALLOWED_ORIGINS", "https://chronicle.example");

        // Default JWT secret is refused in production
        assert!(Config::from_env().is_err());

        env::set_var("JWT_SECRET", "a-real-secret");
        assert!(Config::from_env().is_ok());

        // Wildcard CORS is refused in production
        env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().is_err());

        env::remove_var("APP_ENV");
        env::remove_var("CORS_ALLOWED_ORIGINS");
        env::remove_var("JWT_SECRET");
    }
}
