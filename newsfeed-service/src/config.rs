/// Configuration management for the newsfeed service.
///
/// All settings load from environment variables with development defaults.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Change feed (Redis) configuration
    pub change_feed: ChangeFeedConfig,
    /// Object storage configuration
    pub storage: StorageConfig,
    /// Local identity file
    pub identity: IdentityConfig,
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

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Change feed (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeFeedConfig {
    /// Redis URL
    pub redis_url: String,
    /// Pub/Sub channel carrying post changes
    pub channel: String,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding post images
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible stores; empty means AWS
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Base URL that uploaded object keys are public under
    pub public_base_url: String,
}

/// Local identity file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path of the JSON file holding `{id, username}`
    pub path: String,
}

impl StorageConfig {
    /// Public URL for an uploaded object key.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), key)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("NEWSFEED_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("NEWSFEED_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/newsfeed".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(10),
            },
            change_feed: ChangeFeedConfig {
                redis_url: std::env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                channel: std::env::var("CHANGE_FEED_CHANNEL")
                    .unwrap_or_else(|_| "posts:changes".to_string()),
            },
            storage: {
                let access_key_id =
                    std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "".to_string());
                let secret_access_key =
                    std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "".to_string());

                if app_env.eq_ignore_ascii_case("production")
                    && (access_key_id.trim().is_empty() || secret_access_key.trim().is_empty())
                {
                    return Err(
                        "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set in production"
                            .to_string(),
                    );
                }

                let bucket =
                    std::env::var("S3_BUCKET").unwrap_or_else(|_| "post-images".to_string());

                StorageConfig {
                    public_base_url: std::env::var("S3_PUBLIC_BASE_URL")
                        .unwrap_or_else(|_| format!("http://localhost:9000/{}", bucket)),
                    bucket,
                    region: std::env::var("S3_REGION")
                        .unwrap_or_else(|_| "us-east-1".to_string()),
                    endpoint: std::env::var("S3_ENDPOINT").ok().filter(|e| !e.is_empty()),
                    access_key_id,
                    secret_access_key,
                }
            },
            identity: IdentityConfig {
                path: std::env::var("IDENTITY_PATH")
                    .unwrap_or_else(|_| ".newsfeed/identity.json".to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(base: &str) -> StorageConfig {
        StorageConfig {
            bucket: "post-images".to_string(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            public_base_url: base.to_string(),
        }
    }

    #[test]
    fn test_public_url_joins_key() {
        let config = storage("https://cdn.example.com/post-images");
        assert_eq!(
            config.public_url("abc-123-0"),
            "https://cdn.example.com/post-images/abc-123-0"
        );
    }

    #[test]
    fn test_public_url_tolerates_trailing_slash() {
        let config = storage("https://cdn.example.com/post-images/");
        assert_eq!(
            config.public_url("k"),
            "https://cdn.example.com/post-images/k"
        );
    }
}
