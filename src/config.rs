use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use url::Url;

/// Upper bound on the session TTL, one week in minutes.
const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 7;

/// Paths the router serves outside the story prefix.
const RESERVED_PATHS: [&str; 2] = ["/health", "/api-docs"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub story: StoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoryConfig {
    pub content_dir: PathBuf,
    pub route_prefix: String,
    pub max_sessions: usize,
    pub session_ttl_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid SERVER_PORT".to_string()))?;

        // CORS config
        let allowed_origins = split_list(
            &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        );
        let allow_credentials = env::var("CORS_ALLOW_CREDENTIALS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid CORS_ALLOW_CREDENTIALS".to_string()))?;
        let allowed_methods = split_list(
            &env::var("CORS_ALLOWED_METHODS").unwrap_or_else(|_| "*".to_string()),
        )
        .into_iter()
        .map(|m| if m == "*" { m } else { m.to_uppercase() })
        .collect();
        let allowed_headers =
            split_list(&env::var("CORS_ALLOWED_HEADERS").unwrap_or_else(|_| "*".to_string()));

        // Story config
        let content_dir = env::var("STORY_CONTENT_DIR")
            .unwrap_or_else(|_| "./content".to_string())
            .into();
        let route_prefix =
            env::var("STORY_ROUTE_PREFIX").unwrap_or_else(|_| "/api/story".to_string());
        let max_sessions = env::var("STORY_MAX_SESSIONS")
            .unwrap_or_else(|_| "1024".to_string())
            .parse()
            .map_err(|_| AppError::Configuration("Invalid STORY_MAX_SESSIONS".to_string()))?;
        let session_ttl_minutes = env::var("STORY_SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| {
                AppError::Configuration("Invalid STORY_SESSION_TTL_MINUTES".to_string())
            })?;

        let config = Config {
            server: ServerConfig {
                host: server_host,
                port: server_port,
            },
            cors: CorsConfig {
                allowed_origins,
                allow_credentials,
                allowed_methods,
                allowed_headers,
            },
            story: StoryConfig {
                content_dir,
                route_prefix,
                max_sessions,
                session_ttl_minutes,
            },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        // Validate CORS settings
        if self.cors.allowed_origins.is_empty() {
            return Err(AppError::Configuration(
                "ALLOWED_ORIGINS must list at least one origin".to_string(),
            ));
        }

        for origin in &self.cors.allowed_origins {
            if origin == "*" {
                if self.cors.allow_credentials {
                    return Err(AppError::Configuration(
                        "ALLOWED_ORIGINS cannot be '*' when CORS_ALLOW_CREDENTIALS is enabled; \
                         list the origins explicitly"
                            .to_string(),
                    ));
                }
                continue;
            }
            let parsed = Url::parse(origin).map_err(|_| {
                AppError::Configuration(format!("Invalid origin '{}' in ALLOWED_ORIGINS", origin))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(AppError::Configuration(format!(
                    "Invalid origin '{}' in ALLOWED_ORIGINS",
                    origin
                )));
            }
        }

        if self.cors.allowed_methods.is_empty() {
            return Err(AppError::Configuration(
                "CORS_ALLOWED_METHODS must list at least one method".to_string(),
            ));
        }

        for method in &self.cors.allowed_methods {
            if method == "*" {
                if self.cors.allowed_methods.len() > 1 {
                    return Err(AppError::Configuration(
                        "'*' must be the only entry in CORS_ALLOWED_METHODS".to_string(),
                    ));
                }
                continue;
            }
            http::Method::from_bytes(method.as_bytes()).map_err(|_| {
                AppError::Configuration(format!(
                    "Invalid method '{}' in CORS_ALLOWED_METHODS",
                    method
                ))
            })?;
        }

        if self.cors.allowed_headers.is_empty() {
            return Err(AppError::Configuration(
                "CORS_ALLOWED_HEADERS must list at least one header".to_string(),
            ));
        }

        for header in &self.cors.allowed_headers {
            if header == "*" {
                if self.cors.allowed_headers.len() > 1 {
                    return Err(AppError::Configuration(
                        "'*' must be the only entry in CORS_ALLOWED_HEADERS".to_string(),
                    ));
                }
                continue;
            }
            http::HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
                AppError::Configuration(format!(
                    "Invalid header '{}' in CORS_ALLOWED_HEADERS",
                    header
                ))
            })?;
        }

        // Validate story settings
        if !self.story.route_prefix.starts_with('/') {
            return Err(AppError::Configuration(
                "STORY_ROUTE_PREFIX must start with '/'".to_string(),
            ));
        }

        if self.story.route_prefix.len() < 2 || self.story.route_prefix.ends_with('/') {
            return Err(AppError::Configuration(
                "STORY_ROUTE_PREFIX must name a non-root path without a trailing '/'".to_string(),
            ));
        }

        // nesting under a path the router already serves would panic at startup
        for reserved in RESERVED_PATHS {
            if self.story.route_prefix == reserved
                || self
                    .story
                    .route_prefix
                    .starts_with(&format!("{}/", reserved))
            {
                return Err(AppError::Configuration(format!(
                    "STORY_ROUTE_PREFIX must not shadow the reserved path '{}'",
                    reserved
                )));
            }
        }

        if self.story.max_sessions == 0 {
            return Err(AppError::Configuration(
                "STORY_MAX_SESSIONS must be greater than 0".to_string(),
            ));
        }

        // bounded above so the sweeper's chrono::Duration conversion stays in range
        if self.story.session_ttl_minutes < 1
            || self.story.session_ttl_minutes > MAX_SESSION_TTL_MINUTES
        {
            return Err(AppError::Configuration(format!(
                "STORY_SESSION_TTL_MINUTES must be between 1 and {}",
                MAX_SESSION_TTL_MINUTES
            )));
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
