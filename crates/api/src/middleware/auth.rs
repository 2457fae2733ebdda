//! # Authentication and Authorization
//!
//! Two request layers guard every protected route:
//!
//! 1. [`authenticate`] verifies the bearer token and stores its [`Claims`]
//!    in the request extensions (401 on failure).
//! 2. [`authorize`] / [`authorize_action`] run the central policy for the
//!    route's resource (403 on `Deny`).
//!
//! Rules that depend on who owns a row return `NeedsOwner` at this stage
//! and are settled inside the handler once the row is loaded.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, Method, header, request::Parts},
    middleware::Next,
    response::Response,
};
use eyre::Result;
use tracing::warn;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::auth::Claims,
    policy::{Action, Decision, Resource, Subject, evaluate},
};

use super::error_handling::AppError;
use crate::ApiState;

/// Hashes a password with Argon2 and a fresh random salt, returning the PHC
/// string stored in `users.password_hash`.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| eyre::eyre!("Error hashing password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> WorshipResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| WorshipError::Authentication("Missing bearer token".to_string()))?;

    let mut parts = value.split_ascii_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(WorshipError::Authentication(
            "Authorization must be Bearer".to_string(),
        )),
    }
}

/// Maps an HTTP method onto the policy action it performs.
pub fn action_for_method(method: &Method) -> Action {
    match *method {
        Method::POST => Action::Create,
        Method::PUT | Method::PATCH => Action::Update,
        Method::DELETE => Action::Delete,
        _ => Action::Read,
    }
}

pub async fn authenticate(
    State(state): State<Arc<ApiState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = bearer_token(req.headers())
        .and_then(|token| state.tokens.verify(token))
        .inspect_err(|e| warn!("Rejected request to {}: {}", req.uri().path(), e))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Policy check using the action implied by the request method.
pub async fn authorize(resource: Resource, req: Request, next: Next) -> Result<Response, AppError> {
    let action = action_for_method(req.method());
    authorize_action(resource, action, req, next).await
}

/// Policy check with an explicit action, for routes whose method does not
/// say what they do (`POST /suggestions/:id/approve` is an update).
pub async fn authorize_action(
    resource: Resource,
    action: Action,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let decision = match req.extensions().get::<Claims>() {
        Some(claims) => evaluate(&Subject::from(claims), resource, action, None),
        None => {
            return Err(AppError(WorshipError::Authentication(
                "Missing bearer token".to_string(),
            )));
        }
    };

    match decision {
        Decision::Allow | Decision::NeedsOwner => Ok(next.run(req).await),
        Decision::Deny => {
            warn!(
                "Denied {:?} on {:?}: {} {}",
                action,
                resource,
                req.method(),
                req.uri().path()
            );
            Err(AppError(WorshipError::forbidden()))
        }
    }
}

/// The caller behind an authenticated request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub subject: Subject,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.subject.user_id
    }

    /// Re-runs the policy now that the row's owner is known.
    pub fn authorize(
        &self,
        resource: Resource,
        action: Action,
        owner: Option<uuid::Uuid>,
    ) -> WorshipResult<()> {
        self.subject.authorize(resource, action, owner).inspect_err(|_| {
            warn!(
                "Denied {:?} on {:?} to user {}",
                action, resource, self.subject.user_id
            )
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().cloned().ok_or_else(|| {
            AppError(WorshipError::Authentication(
                "Missing bearer token".to_string(),
            ))
        })?;

        Ok(CurrentUser {
            subject: Subject::from(&claims),
            claims,
        })
    }
}
