use crate::{db_error, models::DbSuggestionSlot};
use chrono::{DateTime, Utc};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::suggestion::SlotStatus,
    workflow::{ensure_slot_submittable, validate_slot_bounds},
};

const SLOT_COLUMNS: &str =
    "id, worship_set_id, assigned_user_id, min_songs, max_songs, due_at, status, created_at";

/// Merged slot values for an update; every field is the final value.
#[derive(Debug, Clone)]
pub struct SlotChanges {
    pub assigned_user_id: Uuid,
    pub min_songs: i32,
    pub max_songs: i32,
    pub due_at: DateTime<Utc>,
    pub status: SlotStatus,
}

pub async fn list_slots(
    pool: &Pool<Postgres>,
    assigned_user_id: Option<Uuid>,
    worship_set_id: Option<Uuid>,
) -> Result<Vec<DbSuggestionSlot>> {
    let slots = sqlx::query_as::<_, DbSuggestionSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM suggestion_slots
        WHERE ($1::UUID IS NULL OR assigned_user_id = $1)
          AND ($2::UUID IS NULL OR worship_set_id = $2)
        ORDER BY due_at ASC
        "#
    ))
    .bind(assigned_user_id)
    .bind(worship_set_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn list_slots_by_set(
    pool: &Pool<Postgres>,
    worship_set_id: Uuid,
) -> Result<Vec<DbSuggestionSlot>> {
    list_slots(pool, None, Some(worship_set_id)).await
}

pub async fn get_slot_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbSuggestionSlot>> {
    let slot = sqlx::query_as::<_, DbSuggestionSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM suggestion_slots WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

pub(crate) async fn lock_slot(
    conn: &mut PgConnection,
    id: Uuid,
) -> WorshipResult<DbSuggestionSlot> {
    sqlx::query_as::<_, DbSuggestionSlot>(&format!(
        "SELECT {SLOT_COLUMNS} FROM suggestion_slots WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?
    .ok_or_else(|| WorshipError::not_found("Suggestion slot", id))
}

pub(crate) async fn count_in_slot(conn: &mut PgConnection, slot_id: Uuid) -> WorshipResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM suggestions WHERE slot_id = $1")
        .bind(slot_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_error)
}

pub async fn create_slot(
    pool: &Pool<Postgres>,
    worship_set_id: Uuid,
    assigned_user_id: Uuid,
    min_songs: i32,
    max_songs: i32,
    due_at: DateTime<Utc>,
) -> Result<DbSuggestionSlot> {
    let id = Uuid::new_v4();

    tracing::debug!(
        "Creating suggestion slot: id={}, worship_set_id={}, assigned_user_id={}, bounds={}..={}",
        id,
        worship_set_id,
        assigned_user_id,
        min_songs,
        max_songs
    );

    let slot = sqlx::query_as::<_, DbSuggestionSlot>(&format!(
        r#"
        INSERT INTO suggestion_slots (id, worship_set_id, assigned_user_id, min_songs, max_songs, due_at, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {SLOT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(worship_set_id)
    .bind(assigned_user_id)
    .bind(min_songs)
    .bind(max_songs)
    .bind(due_at)
    .bind(SlotStatus::Pending.as_str())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    Ok(slot)
}

/// Applies merged changes to a slot. Existing suggestions are kept even
/// when the slot is reassigned, so `max_songs` may not drop below their
/// count.
pub async fn update_slot(
    pool: &Pool<Postgres>,
    id: Uuid,
    changes: &SlotChanges,
) -> WorshipResult<DbSuggestionSlot> {
    validate_slot_bounds(changes.min_songs, changes.max_songs)?;

    let mut tx = pool.begin().await.map_err(db_error)?;
    lock_slot(&mut tx, id).await?;

    let existing = count_in_slot(&mut tx, id).await?;
    if existing > i64::from(changes.max_songs) {
        return Err(WorshipError::Capacity(format!(
            "Slot already holds {} suggestions, more than maxSongs {}",
            existing, changes.max_songs
        )));
    }

    let slot = sqlx::query_as::<_, DbSuggestionSlot>(&format!(
        r#"
        UPDATE suggestion_slots
        SET assigned_user_id = $2, min_songs = $3, max_songs = $4, due_at = $5, status = $6
        WHERE id = $1
        RETURNING {SLOT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.assigned_user_id)
    .bind(changes.min_songs)
    .bind(changes.max_songs)
    .bind(changes.due_at)
    .bind(changes.status.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(slot)
}

/// Marks a slot as submitted once it holds at least `min_songs`
/// suggestions.
pub async fn submit_slot(pool: &Pool<Postgres>, id: Uuid) -> WorshipResult<DbSuggestionSlot> {
    let mut tx = pool.begin().await.map_err(db_error)?;
    let slot = lock_slot(&mut tx, id).await?;

    let existing = count_in_slot(&mut tx, id).await?;
    ensure_slot_submittable(existing, slot.min_songs)?;

    let slot = sqlx::query_as::<_, DbSuggestionSlot>(&format!(
        "UPDATE suggestion_slots SET status = $2 WHERE id = $1 RETURNING {SLOT_COLUMNS}"
    ))
    .bind(id)
    .bind(SlotStatus::Submitted.as_str())
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(slot)
}

/// Deletes a slot and its suggestions. Returns `false` if the slot does not
/// exist.
pub async fn delete_slot(pool: &Pool<Postgres>, id: Uuid) -> WorshipResult<bool> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    match lock_slot(&mut tx, id).await {
        Ok(_) => {}
        Err(WorshipError::NotFound(_)) => return Ok(false),
        Err(e) => return Err(e),
    }

    sqlx::query("DELETE FROM suggestions WHERE slot_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
    sqlx::query("DELETE FROM suggestion_slots WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(true)
}
