/// Configuration management for blog-service
///
/// Everything comes from environment variables (a local `.env` is loaded by
/// the binary). Development gets working defaults; production refuses to
/// start without the settings that must not be guessed.
use cache_invalidation::InvalidationPublisher;
use db_pool::env_utils::{env_or, parse_env_list, parse_env_with_default};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime environment selected by `APP_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    /// Unknown values fall back to development
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => AppEnv::Production,
            _ => AppEnv::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == AppEnv::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: AppEnv,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Redis backs both the query cache and revalidation messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Unset in development means in-process cache and log-only revalidation
    pub redis_url: Option<String>,
    pub invalidation_channel: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let env = AppEnv::parse(&env_or("APP_ENV", "development"));

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ if env.is_production() => {
                return Err("DATABASE_URL must be set in production".to_string())
            }
            _ => "postgresql://localhost/blog".to_string(),
        };

        let redis_url = std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        if env.is_production() && redis_url.is_none() {
            return Err("REDIS_URL must be set in production".to_string());
        }

        let cors = {
            let mut allowed_origins = parse_env_list("CORS_ALLOWED_ORIGINS");
            if allowed_origins.is_empty() {
                if env.is_production() {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string());
                }
                allowed_origins.push("http://localhost:3000".to_string());
            }

            let cors = CorsConfig { allowed_origins };
            if env.is_production() && cors.allows_any_origin() {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }
            cors
        };

        Ok(Config {
            app: AppConfig {
                env,
                host: env_or("BLOG_SERVICE_HOST", "0.0.0.0"),
                port: parse_env_with_default("BLOG_SERVICE_PORT", 8080),
            },
            cors,
            database: DatabaseConfig { url: database_url },
            cache: CacheConfig {
                redis_url,
                invalidation_channel: env_or(
                    "CACHE_INVALIDATION_CHANNEL",
                    InvalidationPublisher::DEFAULT_CHANNEL,
                ),
            },
        })
    }
}
