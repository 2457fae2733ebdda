use eyre::{Result, WrapErr, eyre};
use std::env;
use worship_core::token::DEFAULT_TOKEN_TTL_SECONDS;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Settings for talking to the API from the web tier.
#[derive(Clone)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Secret shared with the API server for HS256 signing
    pub jwt_secret: String,
    pub token_ttl_seconds: i64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            jwt_secret: jwt_secret.into(),
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    /// Reads `API_BASE_URL`, `JWT_SECRET` and `TOKEN_TTL_SECONDS`.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let jwt_secret =
            env::var("JWT_SECRET").wrap_err("JWT_SECRET environment variable must be set")?;
        if jwt_secret.trim().is_empty() {
            return Err(eyre!("JWT_SECRET must not be empty"));
        }

        let token_ttl_seconds = match env::var("TOKEN_TTL_SECONDS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .wrap_err_with(|| format!("Invalid TOKEN_TTL_SECONDS value: {}", raw))?,
            Err(_) => DEFAULT_TOKEN_TTL_SECONDS,
        };

        Ok(Self {
            base_url: normalize_base_url(&base_url),
            jwt_secret,
            token_ttl_seconds,
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn trailing_slashes_are_dropped() {
        let config = ClientConfig::new("http://api.example/ ", "secret");

        assert_eq!(config.base_url, "http://api.example");
        assert_eq!(config.token_ttl_seconds, DEFAULT_TOKEN_TTL_SECONDS);
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "do-not-print");

        assert!(!format!("{:?}", config).contains("do-not-print"));
    }
}
