use crate::{
    conflict_or_db, db_error,
    models::{DbSetSong, DbWorshipSet},
};
use chrono::Utc;
use eyre::{eyre, Result};
use sqlx::{PgConnection, Pool, Postgres, postgres::PgExecutor};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::worship_set::{SetStatus, UpdateWorshipSetRequest},
    workflow::{Placement, next_set_song_position},
};

const SET_COLUMNS: &str = "id, service_id, status, leader_user_id, notes, created_at, updated_at";

const SET_SONG_SELECT: &str = r#"
    SELECT ss.id, ss.worship_set_id, ss.song_version_id, sv.song_id, s.title, ss.position,
           ss.key_override, sv.key AS version_key, s.default_key, ss.is_new,
           ss.youtube_url, ss.notes, ss.created_at
    FROM set_songs ss
    JOIN song_versions sv ON sv.id = ss.song_version_id
    JOIN songs s ON s.id = sv.song_id
"#;

/// A song about to join a set, from a direct add or an approved suggestion.
#[derive(Debug, Clone, Default)]
pub struct NewSetSong {
    pub song_version_id: Uuid,
    pub key_override: Option<String>,
    pub is_new: bool,
    pub youtube_url: Option<String>,
    pub notes: Option<String>,
}

pub async fn list_worship_sets(
    pool: &Pool<Postgres>,
    service_id: Option<Uuid>,
) -> Result<Vec<DbWorshipSet>> {
    let sets = sqlx::query_as::<_, DbWorshipSet>(&format!(
        r#"
        SELECT {SET_COLUMNS}
        FROM worship_sets
        WHERE $1::UUID IS NULL OR service_id = $1
        ORDER BY created_at DESC
        "#
    ))
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    Ok(sets)
}

pub async fn get_worship_set_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbWorshipSet>> {
    let set = sqlx::query_as::<_, DbWorshipSet>(&format!(
        "SELECT {SET_COLUMNS} FROM worship_sets WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(set)
}

pub async fn get_worship_set_by_service_id(
    pool: &Pool<Postgres>,
    service_id: Uuid,
) -> Result<Option<DbWorshipSet>> {
    let set = sqlx::query_as::<_, DbWorshipSet>(&format!(
        "SELECT {SET_COLUMNS} FROM worship_sets WHERE service_id = $1"
    ))
    .bind(service_id)
    .fetch_optional(pool)
    .await?;

    Ok(set)
}

pub async fn create_worship_set(
    pool: &Pool<Postgres>,
    service_id: Uuid,
    leader_user_id: Option<Uuid>,
    notes: Option<&str>,
) -> WorshipResult<DbWorshipSet> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!("Creating worship set: id={}, service_id={}", id, service_id);

    sqlx::query_as::<_, DbWorshipSet>(&format!(
        r#"
        INSERT INTO worship_sets (id, service_id, status, leader_user_id, notes, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {SET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(service_id)
    .bind(SetStatus::Draft.as_str())
    .bind(leader_user_id)
    .bind(notes)
    .bind(now)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        conflict_or_db(
            e,
            format!("Service {} already has a worship set", service_id),
        )
    })
}

/// Returns the id of the service's worship set, creating a draft one (led by
/// the service's leader) when the service has none yet. `None` means the
/// service does not exist.
///
/// Runs on the caller's connection so the new set only survives if the
/// caller commits.
pub async fn ensure_worship_set_for_service(
    conn: &mut PgConnection,
    service_id: Uuid,
) -> WorshipResult<Option<Uuid>> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO worship_sets (id, service_id, status, leader_user_id, created_at, updated_at)
        SELECT $1, s.id, $2, s.leader_user_id, $3, $3
        FROM services s
        WHERE s.id = $4
        ON CONFLICT (service_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(SetStatus::Draft.as_str())
    .bind(now)
    .bind(service_id)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    sqlx::query_scalar::<_, Uuid>("SELECT id FROM worship_sets WHERE service_id = $1")
        .bind(service_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)
}

pub async fn update_worship_set(
    pool: &Pool<Postgres>,
    id: Uuid,
    request: &UpdateWorshipSetRequest,
) -> Result<DbWorshipSet> {
    let set = get_worship_set_by_id(pool, id)
        .await?
        .ok_or_else(|| eyre!("Worship set not found"))?;

    let status = request
        .status
        .map(|status| status.as_str().to_string())
        .unwrap_or(set.status);

    let updated = sqlx::query_as::<_, DbWorshipSet>(&format!(
        r#"
        UPDATE worship_sets
        SET status = $2, leader_user_id = $3, notes = $4, updated_at = $5
        WHERE id = $1
        RETURNING {SET_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status)
    .bind(request.leader_user_id.unwrap_or(set.leader_user_id))
    .bind(match &request.notes {
        Some(notes) => notes.as_ref(),
        None => set.notes.as_ref(),
    })
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(updated)
}

/// Deletes a worship set and everything hanging off it in one transaction.
///
/// Order: suggestions of its slots, the slots, set songs, assignments, then
/// the set itself. Returns `false` if the set does not exist.
pub async fn delete_worship_set(pool: &Pool<Postgres>, id: Uuid) -> WorshipResult<bool> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM worship_sets WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .is_some();
    if !exists {
        return Ok(false);
    }

    let suggestions = sqlx::query(
        r#"
        DELETE FROM suggestions
        WHERE slot_id IN (SELECT id FROM suggestion_slots WHERE worship_set_id = $1)
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(db_error)?
    .rows_affected();

    let slots = sqlx::query("DELETE FROM suggestion_slots WHERE worship_set_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

    let set_songs = sqlx::query("DELETE FROM set_songs WHERE worship_set_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

    let assignments = sqlx::query("DELETE FROM assignments WHERE worship_set_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

    sqlx::query("DELETE FROM worship_sets WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::debug!(
        "Worship set deleted: id={}, suggestions={}, slots={}, set_songs={}, assignments={}",
        id,
        suggestions,
        slots,
        set_songs,
        assignments
    );
    Ok(true)
}

pub async fn list_set_songs(pool: &Pool<Postgres>, worship_set_id: Uuid) -> Result<Vec<DbSetSong>> {
    let songs = sqlx::query_as::<_, DbSetSong>(&format!(
        "{SET_SONG_SELECT} WHERE ss.worship_set_id = $1 ORDER BY ss.position ASC"
    ))
    .bind(worship_set_id)
    .fetch_all(pool)
    .await?;

    Ok(songs)
}

pub(crate) async fn fetch_set_song<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<DbSetSong>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DbSetSong>(&format!("{SET_SONG_SELECT} WHERE ss.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Places a song into a set on an open transaction.
///
/// Locks the set row so concurrent additions serialize, then applies the
/// six-song and one-new-song ceilings.
pub(crate) async fn insert_set_song(
    conn: &mut PgConnection,
    worship_set_id: Uuid,
    song: &NewSetSong,
) -> WorshipResult<DbSetSong> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM worship_sets WHERE id = $1 FOR UPDATE")
        .bind(worship_set_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?
        .ok_or_else(|| WorshipError::not_found("Worship set", worship_set_id))?;

    let occupied: Vec<Placement> = sqlx::query_as::<_, (i32, bool)>(
        "SELECT position, is_new FROM set_songs WHERE worship_set_id = $1",
    )
    .bind(worship_set_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?
    .into_iter()
    .map(|(position, is_new)| Placement { position, is_new })
    .collect();

    let position = next_set_song_position(&occupied, song.is_new)?;
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO set_songs (id, worship_set_id, song_version_id, position, key_override, is_new, youtube_url, notes, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(id)
    .bind(worship_set_id)
    .bind(song.song_version_id)
    .bind(position)
    .bind(&song.key_override)
    .bind(song.is_new)
    .bind(&song.youtube_url)
    .bind(&song.notes)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    tracing::debug!(
        "Set song placed: id={}, worship_set_id={}, position={}",
        id,
        worship_set_id,
        position
    );

    fetch_set_song(&mut *conn, id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| WorshipError::Database(eyre!("Inserted set song {} vanished", id)))
}

pub async fn add_set_song(
    pool: &Pool<Postgres>,
    worship_set_id: Uuid,
    song: &NewSetSong,
) -> WorshipResult<DbSetSong> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let version_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM song_versions WHERE id = $1)")
            .bind(song.song_version_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
    if !version_exists {
        return Err(WorshipError::not_found("Song version", song.song_version_id));
    }

    let set_song = insert_set_song(&mut tx, worship_set_id, song).await?;

    tx.commit().await.map_err(db_error)?;
    Ok(set_song)
}

pub async fn remove_set_song(
    pool: &Pool<Postgres>,
    worship_set_id: Uuid,
    set_song_id: Uuid,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM set_songs WHERE id = $1 AND worship_set_id = $2")
        .bind(set_song_id)
        .bind(worship_set_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
