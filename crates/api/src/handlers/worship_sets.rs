use axum::extract::{Path, Query, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        assignment::{Assignment, UpsertAssignmentsRequest},
        response::Deleted,
        worship_set::{
            AddSetSongRequest, CreateWorshipSetRequest, SetSong, UpdateWorshipSetRequest,
            WorshipSet, WorshipSetDetail, WorshipSetQuery,
        },
    },
};
use worship_db::{
    models::{DbWorshipSet, convert_all},
    repositories::{
        assignments, services, suggestion_slots, users,
        worship_sets::{self, NewSetSong},
    },
};

use super::{ApiResult, CreatedResult, assignments::apply_assignment_map, created, ok};
use crate::{ApiState, middleware::validation::ValidatedJson};

async fn require_worship_set(state: &ApiState, id: Uuid) -> Result<DbWorshipSet, WorshipError> {
    worship_sets::get_worship_set_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Worship set", id))
}

async fn require_leader(state: &ApiState, leader_user_id: Option<Uuid>) -> Result<(), WorshipError> {
    let Some(id) = leader_user_id else {
        return Ok(());
    };

    if users::user_exists(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
    {
        Ok(())
    } else {
        Err(WorshipError::not_found("User", id))
    }
}

#[axum::debug_handler]
pub async fn list_worship_sets(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<WorshipSetQuery>,
) -> ApiResult<Vec<WorshipSet>> {
    let rows = worship_sets::list_worship_sets(&state.db_pool, query.service_id)
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

#[axum::debug_handler]
pub async fn create_worship_set(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateWorshipSetRequest>,
) -> CreatedResult<WorshipSet> {
    services::get_service_by_id(&state.db_pool, payload.service_id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Service", payload.service_id))?;
    require_leader(&state, payload.leader_user_id).await?;

    let worship_set = worship_sets::create_worship_set(
        &state.db_pool,
        payload.service_id,
        payload.leader_user_id,
        payload.notes.as_deref(),
    )
    .await?;

    created(WorshipSet::try_from(worship_set)?)
}

#[axum::debug_handler]
pub async fn get_worship_set(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<WorshipSetDetail> {
    let worship_set = require_worship_set(&state, id).await?;

    let songs = worship_sets::list_set_songs(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?;
    let slots = suggestion_slots::list_slots_by_set(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?;

    ok(WorshipSetDetail {
        worship_set: WorshipSet::try_from(worship_set)?,
        songs: songs.into_iter().map(SetSong::from).collect(),
        suggestion_slots: convert_all(slots)?,
    })
}

#[axum::debug_handler]
pub async fn update_worship_set(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateWorshipSetRequest>,
) -> ApiResult<WorshipSet> {
    require_worship_set(&state, id).await?;
    require_leader(&state, payload.leader_user_id.flatten()).await?;

    let worship_set = worship_sets::update_worship_set(&state.db_pool, id, &payload)
        .await
        .map_err(WorshipError::Database)?;

    ok(WorshipSet::try_from(worship_set)?)
}

/// Deletes the set with its slots, suggestions, set songs and assignments.
#[axum::debug_handler]
pub async fn delete_worship_set(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !worship_sets::delete_worship_set(&state.db_pool, id).await? {
        return Err(WorshipError::not_found("Worship set", id).into());
    }

    tracing::info!("Worship set {} deleted", id);
    ok(Deleted { deleted: true })
}

#[axum::debug_handler]
pub async fn add_set_song(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AddSetSongRequest>,
) -> CreatedResult<SetSong> {
    let song = NewSetSong {
        song_version_id: payload.song_version_id,
        key_override: payload.key_override,
        is_new: payload.is_new,
        youtube_url: payload.youtube_url,
        notes: payload.notes,
    };

    let set_song = worship_sets::add_set_song(&state.db_pool, id, &song).await?;

    created(set_song.into())
}

#[axum::debug_handler]
pub async fn remove_set_song(
    State(state): State<Arc<ApiState>>,
    Path((id, set_song_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Deleted> {
    if !worship_sets::remove_set_song(&state.db_pool, id, set_song_id)
        .await
        .map_err(WorshipError::Database)?
    {
        return Err(WorshipError::not_found("Set song", set_song_id).into());
    }

    ok(Deleted { deleted: true })
}

#[axum::debug_handler]
pub async fn list_set_assignments(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Assignment>> {
    require_worship_set(&state, id).await?;

    let rows = assignments::list_assignments(&state.db_pool, Some(id))
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

#[axum::debug_handler]
pub async fn put_set_assignments(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpsertAssignmentsRequest>,
) -> ApiResult<Vec<Assignment>> {
    ok(apply_assignment_map(&state, id, &payload).await?)
}
