use axum::extract::{Path, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        response::Deleted,
        suggestion::{
            ApproveSuggestionRequest, CreateSuggestionRequest, ReviewOutcome,
            ReviewSuggestionRequest, Suggestion,
        },
        worship_set::SetSong,
    },
    policy::{Action, Resource},
};
use worship_db::repositories::suggestions;

use super::{ApiResult, CreatedResult, created, ok, suggestion_slots::require_slot};
use crate::{
    ApiState,
    middleware::{auth::CurrentUser, validation::ValidatedJson},
};

async fn approve(
    state: &ApiState,
    id: Uuid,
    approval: &ApproveSuggestionRequest,
) -> Result<SetSong, WorshipError> {
    let set_song = suggestions::approve_suggestion(&state.db_pool, id, approval).await?;
    tracing::info!("Suggestion {} approved into position {}", id, set_song.position);
    Ok(set_song.into())
}

async fn reject(state: &ApiState, id: Uuid) -> Result<(), WorshipError> {
    if !suggestions::delete_suggestion(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
    {
        return Err(WorshipError::not_found("Suggestion", id));
    }
    tracing::info!("Suggestion {} rejected", id);
    Ok(())
}

/// Adds a song to a slot. Only the slot's assignee may do this; admins and
/// leaders get no bypass.
#[axum::debug_handler]
pub async fn create_suggestion(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CreateSuggestionRequest>,
) -> CreatedResult<Suggestion> {
    let slot = require_slot(&state, payload.slot_id).await?;
    user.authorize(Resource::Suggestion, Action::Create, Some(slot.assigned_user_id))?;

    let suggestion = suggestions::create_suggestion(&state.db_pool, user.id(), &payload).await?;

    created(suggestion.into())
}

#[axum::debug_handler]
pub async fn list_by_slot(
    State(state): State<Arc<ApiState>>,
    Path(slot_id): Path<Uuid>,
) -> ApiResult<Vec<Suggestion>> {
    require_slot(&state, slot_id).await?;

    let rows = suggestions::list_by_slot(&state.db_pool, slot_id)
        .await
        .map_err(WorshipError::Database)?;

    ok(rows.into_iter().map(Suggestion::from).collect())
}

/// `PUT /suggestions/:id` with `{"status": "approved" | "rejected", ...}`.
#[axum::debug_handler]
pub async fn review_suggestion(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewSuggestionRequest>,
) -> ApiResult<ReviewOutcome> {
    let outcome = match payload.approval() {
        Some(approval) => ReviewOutcome::Approved {
            set_song: approve(&state, id, &approval).await?,
        },
        None => {
            reject(&state, id).await?;
            ReviewOutcome::Rejected { suggestion_id: id }
        }
    };

    ok(outcome)
}

#[axum::debug_handler]
pub async fn approve_suggestion(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ApproveSuggestionRequest>,
) -> CreatedResult<SetSong> {
    created(approve(&state, id, &payload).await?)
}

#[axum::debug_handler]
pub async fn reject_suggestion(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    reject(&state, id).await?;
    ok(Deleted { deleted: true })
}

/// Withdraws a suggestion: its author, or a manager.
#[axum::debug_handler]
pub async fn delete_suggestion(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    let suggestion = suggestions::get_suggestion_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Suggestion", id))?;
    user.authorize(Resource::Suggestion, Action::Delete, Some(suggestion.suggested_by))?;

    reject(&state, id).await?;
    ok(Deleted { deleted: true })
}
