//! API configuration.

use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Generate requests per minute per client IP
    pub generate_rate_per_minute: u32,
    /// Generate burst per client IP
    pub generate_burst: u32,
    /// Upper bound on one pipeline run; the run is cancelled when exceeded
    pub generate_timeout: Duration,
    /// Max request body size (uploads included)
    pub max_body_size: usize,
    /// Base for returned video URLs; derived from the request when unset
    pub public_base_url: Option<String>,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            generate_rate_per_minute: 6,
            generate_burst: 3,
            generate_timeout: Duration::from_secs(900),
            max_body_size: 100 * 1024 * 1024, // 100MB
            public_base_url: None,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            generate_rate_per_minute: std::env::var("GENERATE_RATE_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.generate_rate_per_minute),
            generate_burst: std::env::var("GENERATE_RATE_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.generate_burst),
            generate_timeout: Duration::from_secs(
                std::env::var("GENERATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(900),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
