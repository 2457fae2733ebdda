use axum::extract::State;
use std::sync::Arc;
use worship_core::{
    errors::WorshipError,
    models::user::{CreateUserRequest, User},
    policy::{Action, Resource},
};
use worship_db::{models::convert_all, repositories::users};

use super::{ApiResult, CreatedResult, created, ok};
use crate::{
    ApiState,
    middleware::{auth::CurrentUser, auth::hash_password, validation::ValidatedJson},
};

#[axum::debug_handler]
pub async fn me(State(state): State<Arc<ApiState>>, user: CurrentUser) -> ApiResult<User> {
    let db_user = users::get_user_by_id(&state.db_pool, user.id())
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("User", user.id()))?;

    ok(User::try_from(db_user)?)
}

#[axum::debug_handler]
pub async fn list_users(State(state): State<Arc<ApiState>>, user: CurrentUser) -> ApiResult<Vec<User>> {
    // Musicians reach this handler through the owner rule but own no list
    user.authorize(Resource::User, Action::Read, None)?;

    let rows = users::list_users(&state.db_pool)
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> CreatedResult<User> {
    let password_hash = match &payload.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    let db_user = users::create_user(
        &state.db_pool,
        &payload.email,
        &payload.name,
        password_hash.as_deref(),
        &payload.roles,
    )
    .await?;

    created(User::try_from(db_user)?)
}
