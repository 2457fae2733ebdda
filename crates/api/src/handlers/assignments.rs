use axum::extract::{Path, Query, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        assignment::{
            Assignment, AssignmentQuery, CreateAssignmentRequest,
            RespondToAssignmentRequest, UpsertAssignmentsRequest,
        },
        notification::kinds,
        response::Deleted,
    },
    policy::{Action, Resource},
};
use worship_db::{
    models::convert_all,
    repositories::assignments::{self, AssignmentReplacement},
};

use super::{ApiResult, CreatedResult, created, notifications::notify, ok};
use crate::{
    ApiState,
    middleware::{auth::CurrentUser, validation::ValidatedJson},
};

async fn notify_invited(state: &ApiState, assignment: &Assignment) {
    notify(
        &state.db_pool,
        assignment.user_id,
        kinds::INSTRUMENT_ASSIGNED,
        "You have been assigned an instrument",
        &format!(
            "You are invited to play in worship set {}. Please accept or decline.",
            assignment.worship_set_id
        ),
    )
    .await;
}

/// Notifies everyone who received a new invitation from a bulk map and
/// returns the set's assignments afterwards.
pub(crate) async fn finish_replacement(
    state: &ApiState,
    replacement: AssignmentReplacement,
) -> Result<Vec<Assignment>, WorshipError> {
    let invited: Vec<Assignment> = convert_all(replacement.invited)?;
    for assignment in &invited {
        notify_invited(state, assignment).await;
    }

    convert_all(replacement.assignments)
}

/// Applies a bulk instrument map to a worship set.
pub(crate) async fn apply_assignment_map(
    state: &ApiState,
    worship_set_id: Uuid,
    payload: &UpsertAssignmentsRequest,
) -> Result<Vec<Assignment>, WorshipError> {
    let desired = payload.desired()?;
    let replacement = assignments::replace_for_set(&state.db_pool, worship_set_id, &desired).await?;

    finish_replacement(state, replacement).await
}

#[axum::debug_handler]
pub async fn list_assignments(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<AssignmentQuery>,
) -> ApiResult<Vec<Assignment>> {
    let rows = assignments::list_assignments(&state.db_pool, query.worship_set_id)
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

#[axum::debug_handler]
pub async fn create_assignment(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateAssignmentRequest>,
) -> CreatedResult<Assignment> {
    let assignment = Assignment::try_from(assignments::create_assignment(&state.db_pool, &payload).await?)?;
    notify_invited(&state, &assignment).await;

    created(assignment)
}

/// Accepts or declines an invitation. Only the invited user may answer, and
/// only while the assignment is still `invited`.
#[axum::debug_handler]
pub async fn respond_to_assignment(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RespondToAssignmentRequest>,
) -> ApiResult<Assignment> {
    let current = assignments::get_assignment_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Assignment", id))?;

    user.authorize(Resource::Assignment, Action::Respond, Some(current.user_id))?;

    let updated = Assignment::try_from(
        assignments::respond_to_assignment(&state.db_pool, id, user.id(), payload.status).await?,
    )?;

    tracing::info!("Assignment {} {} by user {}", id, updated.status.as_str(), user.id());
    ok(updated)
}

#[axum::debug_handler]
pub async fn delete_assignment(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !assignments::delete_assignment(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
    {
        return Err(WorshipError::not_found("Assignment", id).into());
    }

    ok(Deleted { deleted: true })
}
