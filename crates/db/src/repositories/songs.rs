use crate::{
    db_error,
    models::{DbSong, DbSongVersion},
};
use chrono::Utc;
use eyre::{eyre, Result};
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::song::{CreateSongRequest, CreateSongVersionRequest, UpdateSongRequest},
};

const SONG_COLUMNS: &str =
    "id, title, artist, ccli_number, default_key, tempo, notes, created_at, updated_at";

const VERSION_COLUMNS: &str = "id, song_id, name, key, youtube_url, notes, created_at";

pub async fn list_songs(pool: &Pool<Postgres>, search: Option<&str>) -> Result<Vec<DbSong>> {
    let pattern = search
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", q));

    let songs = sqlx::query_as::<_, DbSong>(&format!(
        r#"
        SELECT {SONG_COLUMNS}
        FROM songs
        WHERE $1::TEXT IS NULL OR title ILIKE $1 OR artist ILIKE $1
        ORDER BY title ASC
        "#
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

pub async fn create_song(pool: &Pool<Postgres>, request: &CreateSongRequest) -> Result<DbSong> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!("Creating song: id={}, title={}", id, request.title);

    let song = sqlx::query_as::<_, DbSong>(&format!(
        r#"
        INSERT INTO songs (id, title, artist, ccli_number, default_key, tempo, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING {SONG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&request.title)
    .bind(&request.artist)
    .bind(&request.ccli_number)
    .bind(&request.default_key)
    .bind(request.tempo)
    .bind(&request.notes)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(song)
}

pub async fn get_song_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSong>> {
    let song = sqlx::query_as::<_, DbSong>(&format!(
        "SELECT {SONG_COLUMNS} FROM songs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(song)
}

pub async fn update_song(
    pool: &Pool<Postgres>,
    id: Uuid,
    request: &UpdateSongRequest,
) -> Result<DbSong> {
    let song = get_song_by_id(pool, id)
        .await?
        .ok_or_else(|| eyre!("Song not found"))?;

    let updated = sqlx::query_as::<_, DbSong>(&format!(
        r#"
        UPDATE songs
        SET title = $2, artist = $3, ccli_number = $4, default_key = $5,
            tempo = $6, notes = $7, updated_at = $8
        WHERE id = $1
        RETURNING {SONG_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(request.title.as_ref().unwrap_or(&song.title))
    .bind(request.artist.as_ref().or(song.artist.as_ref()))
    .bind(request.ccli_number.as_ref().or(song.ccli_number.as_ref()))
    .bind(request.default_key.as_ref().or(song.default_key.as_ref()))
    .bind(request.tempo.or(song.tempo))
    .bind(request.notes.as_ref().or(song.notes.as_ref()))
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

/// Deletes a song and its versions.
///
/// Refused with a conflict while any set song or suggestion still points at
/// the song. Returns `false` if the song does not exist.
pub async fn delete_song(pool: &Pool<Postgres>, id: Uuid) -> WorshipResult<bool> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM songs WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .is_some();
    if !exists {
        return Ok(false);
    }

    let in_use = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM set_songs ss
            JOIN song_versions sv ON sv.id = ss.song_version_id
            WHERE sv.song_id = $1
        ) OR EXISTS (
            SELECT 1 FROM suggestions WHERE song_id = $1
        )
        "#,
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error)?;

    if in_use {
        return Err(WorshipError::Conflict(
            "Song is used by a worship set or a pending suggestion".to_string(),
        ));
    }

    sqlx::query("DELETE FROM song_versions WHERE song_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
    sqlx::query("DELETE FROM songs WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    tracing::debug!("Song deleted: id={}", id);
    Ok(true)
}

pub async fn list_versions(pool: &Pool<Postgres>, song_id: Uuid) -> Result<Vec<DbSongVersion>> {
    let versions = sqlx::query_as::<_, DbSongVersion>(&format!(
        "SELECT {VERSION_COLUMNS} FROM song_versions WHERE song_id = $1 ORDER BY created_at ASC"
    ))
    .bind(song_id)
    .fetch_all(pool)
    .await?;

    Ok(versions)
}

pub async fn create_version(
    pool: &Pool<Postgres>,
    song_id: Uuid,
    request: &CreateSongVersionRequest,
) -> Result<DbSongVersion> {
    let id = Uuid::new_v4();

    let version = sqlx::query_as::<_, DbSongVersion>(&format!(
        r#"
        INSERT INTO song_versions (id, song_id, name, key, youtube_url, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {VERSION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(song_id)
    .bind(&request.name)
    .bind(&request.key)
    .bind(&request.youtube_url)
    .bind(&request.notes)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(version)
}
