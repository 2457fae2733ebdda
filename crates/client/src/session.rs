//! # Session to bearer token exchange
//!
//! The web front end authenticates users with its own sessions. Before it
//! calls the API it swaps the session for a backend token signed with the
//! secret both sides share. Tokens are cached per session and reissued
//! shortly before they expire.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::{auth::Claims, user::Role},
    token::TokenKeys,
};

use crate::config::ClientConfig;

/// A cached token is reissued once it has less than this left to live.
pub const REFRESH_MARGIN_SECONDS: i64 = 60;

/// The signed-in web user, as the front end's session store knows them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSession {
    pub session_id: String,
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub roles: Vec<Role>,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// A bearer token the API will accept for this session.
    async fn bearer_token(&self, session: &WebSession) -> WorshipResult<String>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Signs HS256 tokens locally with the shared secret.
#[derive(Debug)]
pub struct SignedCredentialExchange {
    keys: TokenKeys,
    cache: RwLock<HashMap<String, CachedToken>>,
}

impl SignedCredentialExchange {
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            keys: TokenKeys::new(secret, ttl_seconds),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl_seconds)
    }

    /// Drops the cached token of a session, e.g. on logout.
    pub async fn forget(&self, session_id: &str) {
        self.cache.write().await.remove(session_id);
    }

    /// Token lifetime is the configured TTL, cut short by the session's own
    /// expiry.
    fn mint(&self, session: &WebSession, now: DateTime<Utc>) -> WorshipResult<CachedToken> {
        let expires_at = (now + self.keys.ttl()).min(session.expires_at);
        let claims = Claims::new(
            session.user_id,
            session.email.clone(),
            session.name.clone(),
            session.roles.clone(),
            now,
            expires_at,
        );

        Ok(CachedToken {
            token: self.keys.sign(&claims)?,
            expires_at,
        })
    }

    pub(crate) async fn bearer_token_at(
        &self,
        session: &WebSession,
        now: DateTime<Utc>,
    ) -> WorshipResult<String> {
        if session.expires_at <= now {
            return Err(WorshipError::Authentication(
                "Session has expired".to_string(),
            ));
        }
        if session.roles.is_empty() {
            return Err(WorshipError::Authentication(
                "Session carries no roles".to_string(),
            ));
        }

        let margin = Duration::seconds(REFRESH_MARGIN_SECONDS);
        if let Some(cached) = self.cache.read().await.get(&session.session_id) {
            if cached.expires_at - now > margin {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.mint(session, now)?;
        let token = fresh.token.clone();
        debug!(
            "Issued backend token for user {} until {}",
            session.user_id, fresh.expires_at
        );

        let mut cache = self.cache.write().await;
        cache.retain(|_, cached| cached.expires_at > now);
        cache.insert(session.session_id.clone(), fresh);

        Ok(token)
    }
}

#[async_trait]
impl CredentialExchange for SignedCredentialExchange {
    async fn bearer_token(&self, session: &WebSession) -> WorshipResult<String> {
        self.bearer_token_at(session, Utc::now()).await
    }
}
