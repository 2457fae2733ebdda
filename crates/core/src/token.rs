//! Bearer token signing and verification (HS256).
//!
//! The same secret is shared by the API server and the web front end's
//! credential exchange, so a token minted by either side is accepted by the
//! server.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::fmt;

use crate::{
    errors::{WorshipError, WorshipResult},
    models::{auth::Claims, user::User},
};

/// Default bearer token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints a token for `user`, valid for the configured lifetime.
    pub fn issue(&self, user: &User) -> WorshipResult<(String, Claims)> {
        let now = Utc::now();
        let claims = Claims::new(
            user.id,
            user.email.clone(),
            Some(user.name.clone()),
            user.roles.clone(),
            now,
            now + self.ttl,
        );
        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    pub fn sign(&self, claims: &Claims) -> WorshipResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| WorshipError::Internal(Box::new(e)))
    }

    /// Verifies signature and expiry and returns the claims.
    pub fn verify(&self, token: &str) -> WorshipResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| WorshipError::Authentication(format!("Invalid token: {}", e)))?;

        if data.claims.roles.is_empty() {
            return Err(WorshipError::Authentication(
                "Token carries no roles".to_string(),
            ));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use fake::{Fake, faker::internet::en::SafeEmail, faker::name::en::Name};
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn user(roles: Vec<Role>) -> User {
        User {
            id: Uuid::new_v4(),
            email: SafeEmail().fake(),
            name: Name().fake(),
            roles,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new(b"test-secret", DEFAULT_TOKEN_TTL_SECONDS);
        let user = user(vec![Role::Leader]);

        let (token, claims) = keys.issue(&user).unwrap();
        let verified = keys.verify(&token).unwrap();

        assert_eq!(verified, claims);
        assert_eq!(verified.sub, user.id);
        assert_eq!(verified.roles, vec![Role::Leader]);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", DEFAULT_TOKEN_TTL_SECONDS);
        let other = TokenKeys::new(b"other-secret", DEFAULT_TOKEN_TTL_SECONDS);
        let (token, _) = keys.issue(&user(vec![Role::Admin])).unwrap();

        assert!(matches!(
            other.verify(&token),
            Err(WorshipError::Authentication(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", DEFAULT_TOKEN_TTL_SECONDS);
        let issued = Utc::now() - Duration::hours(3);
        let claims = Claims::new(
            Uuid::new_v4(),
            "old@example.com",
            None,
            vec![Role::Musician],
            issued,
            issued + Duration::hours(1),
        );
        let token = keys.sign(&claims).unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn token_without_roles_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", DEFAULT_TOKEN_TTL_SECONDS);
        let now = Utc::now();
        let claims = Claims::new(
            Uuid::new_v4(),
            "nobody@example.com",
            None,
            vec![],
            now,
            now + Duration::hours(1),
        );
        let token = keys.sign(&claims).unwrap();

        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::new(b"test-secret", DEFAULT_TOKEN_TTL_SECONDS);
        assert!(keys.verify("not-a-jwt").is_err());
    }
}
