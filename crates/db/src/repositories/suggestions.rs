use crate::{
    db_error,
    models::{DbSetSong, DbSuggestion},
    repositories::{
        suggestion_slots::{count_in_slot, lock_slot},
        worship_sets::{NewSetSong, insert_set_song},
    },
};
use chrono::Utc;
use eyre::{Result, eyre};
use sqlx::{Pool, Postgres, postgres::PgExecutor};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::suggestion::{ApproveSuggestionRequest, CreateSuggestionRequest},
    workflow::ensure_slot_capacity,
};

const SUGGESTION_SELECT: &str = r#"
    SELECT sg.id, sg.slot_id, sg.song_id, s.title AS song_title, sg.suggested_by,
           sg.notes, sg.youtube_url, sg.created_at
    FROM suggestions sg
    JOIN songs s ON s.id = sg.song_id
"#;

async fn fetch_suggestion<'e, E>(executor: E, id: Uuid) -> sqlx::Result<Option<DbSuggestion>>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, DbSuggestion>(&format!("{SUGGESTION_SELECT} WHERE sg.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list_by_slot(pool: &Pool<Postgres>, slot_id: Uuid) -> Result<Vec<DbSuggestion>> {
    let suggestions = sqlx::query_as::<_, DbSuggestion>(&format!(
        "{SUGGESTION_SELECT} WHERE sg.slot_id = $1 ORDER BY sg.created_at ASC"
    ))
    .bind(slot_id)
    .fetch_all(pool)
    .await?;

    Ok(suggestions)
}

pub async fn get_suggestion_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSuggestion>> {
    Ok(fetch_suggestion(pool, id).await?)
}

/// Adds a suggestion to a slot on behalf of `suggested_by`.
///
/// The slot row stays locked from the count until the insert commits, so
/// two concurrent submissions cannot both take the last place.
pub async fn create_suggestion(
    pool: &Pool<Postgres>,
    suggested_by: Uuid,
    request: &CreateSuggestionRequest,
) -> WorshipResult<DbSuggestion> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let slot = lock_slot(&mut tx, request.slot_id).await?;

    let song_exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM songs WHERE id = $1)")
            .bind(request.song_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
    if !song_exists {
        return Err(WorshipError::not_found("Song", request.song_id));
    }

    let existing = count_in_slot(&mut tx, slot.id).await?;
    ensure_slot_capacity(existing, slot.max_songs)?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO suggestions (id, slot_id, song_id, suggested_by, notes, youtube_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(slot.id)
    .bind(request.song_id)
    .bind(suggested_by)
    .bind(&request.notes)
    .bind(&request.youtube_url)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await
    .map_err(db_error)?;

    let suggestion = fetch_suggestion(&mut *tx, id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| WorshipError::Database(eyre!("Inserted suggestion {} vanished", id)))?;

    tx.commit().await.map_err(db_error)?;

    tracing::debug!(
        "Suggestion created: id={}, slot_id={}, count={}/{}",
        id,
        slot.id,
        existing + 1,
        slot.max_songs
    );
    Ok(suggestion)
}

pub async fn delete_suggestion(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM suggestions WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Turns a suggestion into a set song of its slot's worship set and
/// removes the suggestion, in one transaction.
pub async fn approve_suggestion(
    pool: &Pool<Postgres>,
    id: Uuid,
    approval: &ApproveSuggestionRequest,
) -> WorshipResult<DbSetSong> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let suggestion = sqlx::query_as::<_, (Uuid, Uuid, Option<String>, Option<String>)>(
        "SELECT slot_id, song_id, notes, youtube_url FROM suggestions WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?;
    let Some((slot_id, song_id, notes, youtube_url)) = suggestion else {
        return Err(WorshipError::not_found("Suggestion", id));
    };

    let worship_set_id =
        sqlx::query_scalar::<_, Uuid>("SELECT worship_set_id FROM suggestion_slots WHERE id = $1")
            .bind(slot_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;

    let version_song_id =
        sqlx::query_scalar::<_, Uuid>("SELECT song_id FROM song_versions WHERE id = $1")
            .bind(approval.song_version_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?
            .ok_or_else(|| WorshipError::not_found("Song version", approval.song_version_id))?;
    if version_song_id != song_id {
        return Err(WorshipError::Validation(format!(
            "Song version {} does not belong to the suggested song",
            approval.song_version_id
        )));
    }

    let new_song = NewSetSong {
        song_version_id: approval.song_version_id,
        key_override: approval.key_override.clone(),
        is_new: approval.is_new,
        youtube_url,
        notes,
    };
    let set_song = insert_set_song(&mut tx, worship_set_id, &new_song).await?;

    sqlx::query("DELETE FROM suggestions WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;

    tracing::debug!(
        "Suggestion approved: id={}, set_song_id={}, position={}",
        id,
        set_song.id,
        set_song.position
    );
    Ok(set_song)
}
