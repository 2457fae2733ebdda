use axum::extract::State;
use std::sync::Arc;
use tracing::{info, warn};
use worship_core::{
    errors::WorshipError,
    models::user::{LoginRequest, LoginResponse, User},
};
use worship_db::repositories::users;

use super::{ApiResult, ok};
use crate::{ApiState, middleware::validation::ValidatedJson};

/// Exchanges email and password for a bearer token.
///
/// Unknown emails and wrong passwords get the same 401 so the endpoint does
/// not reveal which accounts exist.
#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let Some(db_user) = users::verify_credentials(&state.db_pool, &payload.email, &payload.password)
        .await
        .map_err(WorshipError::Database)?
    else {
        warn!("Failed login for {}", payload.email);
        return Err(WorshipError::Authentication("Invalid email or password".to_string()).into());
    };

    let user = User::try_from(db_user)?;
    let (token, claims) = state.tokens.issue(&user)?;

    info!("User {} logged in", user.id);
    ok(LoginResponse {
        token,
        expires_at: claims.expires_at(),
        user,
    })
}
