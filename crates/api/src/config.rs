//! # API Configuration Module
//!
//! Loads the server configuration from environment variables.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: Address to bind to (default: "0.0.0.0")
//! - `API_PORT`: Port to listen on (default: 3001)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: trace, debug, info, warn or error (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `JWT_SECRET`: HS256 secret shared with the web front end (required)
//! - `TOKEN_TTL_SECONDS`: Lifetime of tokens issued by `/auth/login` (default: 3600)
//! - `API_MAX_BODY_BYTES`: Request body cap (default: 10240)
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 30)

use eyre::{Result, WrapErr, eyre};
use std::env;
use tracing::Level;
use worship_core::token::DEFAULT_TOKEN_TTL_SECONDS;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for the API server.
///
/// ```no_run
/// use worship_api::config::ApiConfig;
///
/// let config = ApiConfig::from_env()?;
/// println!("Starting server on {}", config.server_addr());
/// # Ok::<(), eyre::Report>(())
/// ```
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origins: Option<Vec<String>>,
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
    pub max_body_bytes: usize,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("cors_origins", &self.cors_origins)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Parses a `LOG_LEVEL` value, falling back to `INFO` for anything unknown.
pub fn parse_log_level(value: &str) -> Level {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Splits a comma-separated origin list, dropping empty entries.
pub fn parse_cors_origins(value: &str) -> Option<Vec<String>> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect();

    (!origins.is_empty()).then_some(origins)
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid {} value: {}", name, raw)),
        Err(_) => Ok(default),
    }
}

impl ApiConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if `DATABASE_URL` or `JWT_SECRET` is unset, or if a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self> {
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_or("API_PORT", DEFAULT_PORT)?;

        let database_url =
            env::var("DATABASE_URL").wrap_err("DATABASE_URL environment variable must be set")?;

        let log_level = parse_log_level(&env::var("LOG_LEVEL").unwrap_or_default());

        let cors_origins = env::var("API_CORS_ORIGINS")
            .ok()
            .and_then(|origins| parse_cors_origins(&origins));

        let jwt_secret =
            env::var("JWT_SECRET").wrap_err("JWT_SECRET environment variable must be set")?;
        if jwt_secret.trim().is_empty() {
            return Err(eyre!("JWT_SECRET must not be empty"));
        }

        let token_ttl_seconds = parse_or("TOKEN_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS)?;
        let max_body_bytes = parse_or("API_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;
        let request_timeout =
            parse_or("API_REQUEST_TIMEOUT_SECONDS", DEFAULT_REQUEST_TIMEOUT_SECONDS)?;

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            jwt_secret,
            token_ttl_seconds,
            max_body_bytes,
            request_timeout,
        })
    }

    /// Returns the server address, e.g. `0.0.0.0:3001`.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("debug", Level::DEBUG)]
    #[case(" WARN ", Level::WARN)]
    #[case("error", Level::ERROR)]
    #[case("", Level::INFO)]
    #[case("verbose", Level::INFO)]
    fn log_levels(#[case] raw: &str, #[case] expected: Level) {
        assert_eq!(parse_log_level(raw), expected);
    }

    #[test]
    fn cors_origins_are_trimmed() {
        assert_eq!(
            parse_cors_origins("https://a.example, https://b.example ,"),
            Some(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert_eq!(parse_cors_origins(" , "), None);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = ApiConfig {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            database_url: "postgres://user:pw@db/worship".to_string(),
            log_level: Level::INFO,
            cors_origins: None,
            jwt_secret: "super-secret".to_string(),
            token_ttl_seconds: 3600,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("pw@db"));
        assert_eq!(config.server_addr(), "0.0.0.0:3001");
    }
}
