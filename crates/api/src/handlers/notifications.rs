use axum::extract::{Path, State};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::notification::{CreateNotificationRequest, Notification},
    policy::{Action, Resource},
};
use worship_db::{
    models::DbNotification,
    repositories::{notifications, users},
};

use super::{ApiResult, CreatedResult, created, ok};
use crate::{
    ApiState,
    middleware::{auth::CurrentUser, validation::ValidatedJson},
};

/// Records a notification raised by a workflow.
///
/// Runs after the workflow has committed, so a failure here is logged and
/// does not fail the request.
pub(crate) async fn notify(pool: &PgPool, user_id: Uuid, kind: &str, title: &str, body: &str) {
    if let Err(e) = notifications::create_notification(pool, user_id, kind, title, body).await {
        tracing::warn!("Failed to notify user {} ({}): {:?}", user_id, kind, e);
    }
}

async fn require_notification(state: &ApiState, id: Uuid) -> Result<DbNotification, WorshipError> {
    notifications::get_notification_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Notification", id))
}

#[axum::debug_handler]
pub async fn list_for_user(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Vec<Notification>> {
    user.authorize(Resource::Notification, Action::Read, Some(user_id))?;

    let rows = notifications::list_for_user(&state.db_pool, user_id)
        .await
        .map_err(WorshipError::Database)?;

    ok(rows.into_iter().map(Notification::from).collect())
}

#[axum::debug_handler]
pub async fn get_notification(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    let notification = require_notification(&state, id).await?;
    user.authorize(Resource::Notification, Action::Read, Some(notification.user_id))?;

    ok(notification.into())
}

#[axum::debug_handler]
pub async fn create_notification(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateNotificationRequest>,
) -> CreatedResult<Notification> {
    if !users::user_exists(&state.db_pool, payload.user_id)
        .await
        .map_err(WorshipError::Database)?
    {
        return Err(WorshipError::not_found("User", payload.user_id).into());
    }

    let notification = notifications::create_notification(
        &state.db_pool,
        payload.user_id,
        &payload.kind,
        &payload.title,
        &payload.body,
    )
    .await
    .map_err(WorshipError::Database)?;

    created(notification.into())
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    let notification = require_notification(&state, id).await?;
    user.authorize(Resource::Notification, Action::Update, Some(notification.user_id))?;

    let notification = notifications::mark_read(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Notification", id))?;

    ok(notification.into())
}
