use axum::extract::{Path, Query, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        response::Deleted,
        song::{
            CreateSongRequest, CreateSongVersionRequest, Song, SongDetail, SongQuery, SongVersion,
            UpdateSongRequest,
        },
    },
};
use worship_db::{models::DbSong, repositories::songs};

use super::{ApiResult, CreatedResult, created, ok};
use crate::{ApiState, middleware::validation::ValidatedJson};

async fn require_song(state: &ApiState, id: Uuid) -> Result<DbSong, WorshipError> {
    songs::get_song_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Song", id))
}

#[axum::debug_handler]
pub async fn list_songs(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<SongQuery>,
) -> ApiResult<Vec<Song>> {
    let rows = songs::list_songs(&state.db_pool, query.q.as_deref())
        .await
        .map_err(WorshipError::Database)?;

    ok(rows.into_iter().map(Song::from).collect())
}

#[axum::debug_handler]
pub async fn create_song(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateSongRequest>,
) -> CreatedResult<Song> {
    let song = songs::create_song(&state.db_pool, &payload)
        .await
        .map_err(WorshipError::Database)?;

    created(song.into())
}

#[axum::debug_handler]
pub async fn get_song(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SongDetail> {
    let song = require_song(&state, id).await?;
    let versions = songs::list_versions(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?;

    ok(SongDetail {
        song: song.into(),
        versions: versions.into_iter().map(SongVersion::from).collect(),
    })
}

#[axum::debug_handler]
pub async fn update_song(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSongRequest>,
) -> ApiResult<Song> {
    require_song(&state, id).await?;

    let song = songs::update_song(&state.db_pool, id, &payload)
        .await
        .map_err(WorshipError::Database)?;

    ok(song.into())
}

#[axum::debug_handler]
pub async fn delete_song(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !songs::delete_song(&state.db_pool, id).await? {
        return Err(WorshipError::not_found("Song", id).into());
    }

    ok(Deleted { deleted: true })
}

#[axum::debug_handler]
pub async fn list_versions(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<SongVersion>> {
    require_song(&state, id).await?;

    let versions = songs::list_versions(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?;

    ok(versions.into_iter().map(SongVersion::from).collect())
}

#[axum::debug_handler]
pub async fn create_version(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CreateSongVersionRequest>,
) -> CreatedResult<SongVersion> {
    require_song(&state, id).await?;

    let version = songs::create_version(&state.db_pool, id, &payload)
        .await
        .map_err(WorshipError::Database)?;

    created(version.into())
}
