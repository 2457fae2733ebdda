use axum::extract::{Path, Query, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        notification::kinds,
        response::Deleted,
        suggestion::{
            CreateSuggestionSlotRequest, SlotQuery, Suggestion, SuggestionSlot,
            SuggestionSlotDetail, UpdateSuggestionSlotRequest,
        },
    },
    policy::{Action, Resource},
};
use worship_db::{
    models::{DbSuggestionSlot, convert_all},
    repositories::{
        suggestion_slots::{self, SlotChanges},
        suggestions, users, worship_sets,
    },
};

use super::{ApiResult, CreatedResult, created, notifications::notify, ok};
use crate::{
    ApiState,
    middleware::{auth::CurrentUser, validation::ValidatedJson},
};

pub(crate) async fn require_slot(state: &ApiState, id: Uuid) -> Result<DbSuggestionSlot, WorshipError> {
    suggestion_slots::get_slot_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Suggestion slot", id))
}

async fn require_user(state: &ApiState, id: Uuid) -> Result<(), WorshipError> {
    if users::user_exists(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
    {
        Ok(())
    } else {
        Err(WorshipError::not_found("User", id))
    }
}

async fn notify_slot_assigned(state: &ApiState, slot: &SuggestionSlot) {
    notify(
        &state.db_pool,
        slot.assigned_user_id,
        kinds::SUGGESTION_SLOT_ASSIGNED,
        "You have been asked to suggest songs",
        &format!(
            "Suggest between {} and {} songs by {}.",
            slot.min_songs,
            slot.max_songs,
            slot.due_at.to_rfc3339()
        ),
    )
    .await;
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Vec<SuggestionSlot>> {
    let rows = suggestion_slots::list_slots(&state.db_pool, query.assigned_user_id, query.worship_set_id)
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

#[axum::debug_handler]
pub async fn list_slots_by_set(
    State(state): State<Arc<ApiState>>,
    Path(set_id): Path<Uuid>,
) -> ApiResult<Vec<SuggestionSlot>> {
    let rows = suggestion_slots::list_slots_by_set(&state.db_pool, set_id)
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

#[axum::debug_handler]
pub async fn create_slot(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateSuggestionSlotRequest>,
) -> CreatedResult<SuggestionSlot> {
    worship_sets::get_worship_set_by_id(&state.db_pool, payload.worship_set_id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Worship set", payload.worship_set_id))?;
    require_user(&state, payload.assigned_user_id).await?;

    let row = suggestion_slots::create_slot(
        &state.db_pool,
        payload.worship_set_id,
        payload.assigned_user_id,
        payload.min_songs,
        payload.max_songs,
        payload.due_at,
    )
    .await
    .map_err(WorshipError::Database)?;

    let slot = SuggestionSlot::try_from(row)?;
    notify_slot_assigned(&state, &slot).await;

    created(slot)
}

#[axum::debug_handler]
pub async fn get_slot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SuggestionSlotDetail> {
    let slot = require_slot(&state, id).await?;
    let rows = suggestions::list_by_slot(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?;

    ok(SuggestionSlotDetail {
        slot: SuggestionSlot::try_from(slot)?,
        suggestions: rows.into_iter().map(Suggestion::from).collect(),
    })
}

/// Partial update, including reassignment to another user. Existing
/// suggestions stay with the slot.
#[axum::debug_handler]
pub async fn update_slot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSuggestionSlotRequest>,
) -> ApiResult<SuggestionSlot> {
    let current = SuggestionSlot::try_from(require_slot(&state, id).await?)?;

    if let Some(user_id) = payload.assigned_user_id {
        require_user(&state, user_id).await?;
    }

    let changes = SlotChanges {
        assigned_user_id: payload.assigned_user_id.unwrap_or(current.assigned_user_id),
        min_songs: payload.min_songs.unwrap_or(current.min_songs),
        max_songs: payload.max_songs.unwrap_or(current.max_songs),
        due_at: payload.due_at.unwrap_or(current.due_at),
        status: payload.status.unwrap_or(current.status),
    };

    let slot = SuggestionSlot::try_from(suggestion_slots::update_slot(&state.db_pool, id, &changes).await?)?;

    if slot.assigned_user_id != current.assigned_user_id {
        tracing::info!(
            "Suggestion slot {} reassigned from {} to {}",
            id,
            current.assigned_user_id,
            slot.assigned_user_id
        );
        notify_slot_assigned(&state, &slot).await;
    }

    ok(slot)
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !suggestion_slots::delete_slot(&state.db_pool, id).await? {
        return Err(WorshipError::not_found("Suggestion slot", id).into());
    }

    ok(Deleted { deleted: true })
}

/// Marks the caller's slot as submitted.
#[axum::debug_handler]
pub async fn submit_slot(
    State(state): State<Arc<ApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<SuggestionSlot> {
    let slot = require_slot(&state, id).await?;
    user.authorize(Resource::SuggestionSlot, Action::Respond, Some(slot.assigned_user_id))?;

    let slot = suggestion_slots::submit_slot(&state.db_pool, id).await?;

    ok(SuggestionSlot::try_from(slot)?)
}
