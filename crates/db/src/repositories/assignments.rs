use super::worship_sets;
use crate::{conflict_or_db, db_error, models::DbAssignment};
use chrono::Utc;
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::assignment::{AssignmentStatus, CreateAssignmentRequest},
    workflow::{AssignmentChange, CurrentAssignment, plan_assignment_changes},
};

const ASSIGNMENT_COLUMNS: &str =
    "id, worship_set_id, instrument_id, user_id, status, invited_at, responded_at";

/// Result of a bulk replacement: the set's assignments afterwards, plus the
/// rows that were newly created or handed to a different user.
#[derive(Debug, Clone, Default)]
pub struct AssignmentReplacement {
    pub assignments: Vec<DbAssignment>,
    pub invited: Vec<DbAssignment>,
}

pub async fn list_assignments(
    pool: &Pool<Postgres>,
    worship_set_id: Option<Uuid>,
) -> Result<Vec<DbAssignment>> {
    let assignments = sqlx::query_as::<_, DbAssignment>(
        r#"
        SELECT a.id, a.worship_set_id, a.instrument_id, a.user_id, a.status, a.invited_at, a.responded_at
        FROM assignments a
        JOIN instruments i ON i.id = a.instrument_id
        WHERE $1::UUID IS NULL OR a.worship_set_id = $1
        ORDER BY i.display_order ASC, i.name ASC
        "#,
    )
    .bind(worship_set_id)
    .fetch_all(pool)
    .await?;

    Ok(assignments)
}

pub async fn get_assignment_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbAssignment>> {
    let assignment = sqlx::query_as::<_, DbAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(assignment)
}

async fn ensure_row_exists(
    conn: &mut PgConnection,
    table: &str,
    entity: &str,
    id: Uuid,
) -> WorshipResult<()> {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE id = $1)"
    ))
    .bind(id)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;

    if exists {
        Ok(())
    } else {
        Err(WorshipError::not_found(entity, id))
    }
}

pub async fn create_assignment(
    pool: &Pool<Postgres>,
    request: &CreateAssignmentRequest,
) -> WorshipResult<DbAssignment> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    ensure_row_exists(&mut tx, "worship_sets", "Worship set", request.worship_set_id).await?;
    ensure_row_exists(&mut tx, "instruments", "Instrument", request.instrument_id).await?;
    ensure_row_exists(&mut tx, "users", "User", request.user_id).await?;

    let assignment = sqlx::query_as::<_, DbAssignment>(&format!(
        r#"
        INSERT INTO assignments (id, worship_set_id, instrument_id, user_id, status, invited_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {ASSIGNMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(request.worship_set_id)
    .bind(request.instrument_id)
    .bind(request.user_id)
    .bind(AssignmentStatus::Invited.as_str())
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| conflict_or_db(e, "Instrument is already assigned in this worship set"))?;

    tx.commit().await.map_err(db_error)?;
    Ok(assignment)
}

/// Records `responder`'s reply to an invitation.
///
/// The row is locked while the transition is checked, so only one reply can
/// ever leave `invited`. A row that was handed to someone else in the
/// meantime is refused like any other non-owner.
pub async fn respond_to_assignment(
    pool: &Pool<Postgres>,
    id: Uuid,
    responder: Uuid,
    reply: AssignmentStatus,
) -> WorshipResult<DbAssignment> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let current = sqlx::query_as::<_, DbAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error)?
    .ok_or_else(|| WorshipError::not_found("Assignment", id))?;

    if current.user_id != responder {
        return Err(WorshipError::Authorization(
            "Only the invited user can answer this assignment".to_string(),
        ));
    }
    let status = current.status.parse::<AssignmentStatus>()?.respond(reply)?;

    let assignment = sqlx::query_as::<_, DbAssignment>(&format!(
        r#"
        UPDATE assignments
        SET status = $2, responded_at = $3
        WHERE id = $1
        RETURNING {ASSIGNMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(status.as_str())
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(assignment)
}

pub async fn delete_assignment(pool: &Pool<Postgres>, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Applies a per-instrument assignment map to a worship set in one
/// transaction.
///
/// Instruments left out of `desired` are not touched. Concurrent callers
/// are not serialized beyond the set row lock: the last commit wins.
pub async fn replace_for_set(
    pool: &Pool<Postgres>,
    worship_set_id: Uuid,
    desired: &[(Uuid, Option<Uuid>)],
) -> WorshipResult<AssignmentReplacement> {
    let mut tx = pool.begin().await.map_err(db_error)?;
    let replacement = apply_map(&mut tx, worship_set_id, desired).await?;
    tx.commit().await.map_err(db_error)?;

    Ok(replacement)
}

/// Like [`replace_for_set`], addressed by service. A service without a set
/// gets a draft one in the same transaction, so a refused map creates
/// nothing.
pub async fn replace_for_service(
    pool: &Pool<Postgres>,
    service_id: Uuid,
    desired: &[(Uuid, Option<Uuid>)],
) -> WorshipResult<AssignmentReplacement> {
    let mut tx = pool.begin().await.map_err(db_error)?;
    let worship_set_id = worship_sets::ensure_worship_set_for_service(&mut tx, service_id)
        .await?
        .ok_or_else(|| WorshipError::not_found("Service", service_id))?;
    let replacement = apply_map(&mut tx, worship_set_id, desired).await?;
    tx.commit().await.map_err(db_error)?;

    Ok(replacement)
}

async fn apply_map(
    tx: &mut PgConnection,
    worship_set_id: Uuid,
    desired: &[(Uuid, Option<Uuid>)],
) -> WorshipResult<AssignmentReplacement> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM worship_sets WHERE id = $1 FOR UPDATE")
        .bind(worship_set_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| WorshipError::not_found("Worship set", worship_set_id))?;

    for (instrument_id, user_id) in desired {
        ensure_row_exists(tx, "instruments", "Instrument", *instrument_id).await?;
        if let Some(user_id) = user_id {
            ensure_row_exists(tx, "users", "User", *user_id).await?;
        }
    }

    let current: Vec<CurrentAssignment> = sqlx::query_as::<_, (Uuid, Uuid, Uuid)>(
        "SELECT id, instrument_id, user_id FROM assignments WHERE worship_set_id = $1",
    )
    .bind(worship_set_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(db_error)?
    .into_iter()
    .map(|(id, instrument_id, user_id)| CurrentAssignment {
        id,
        instrument_id,
        user_id,
    })
    .collect();

    let changes = plan_assignment_changes(&current, desired);
    let now = Utc::now();
    let mut invited = Vec::new();

    for change in &changes {
        match *change {
            AssignmentChange::Create {
                instrument_id,
                user_id,
            } => {
                let row = sqlx::query_as::<_, DbAssignment>(&format!(
                    r#"
                    INSERT INTO assignments (id, worship_set_id, instrument_id, user_id, status, invited_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {ASSIGNMENT_COLUMNS}
                    "#
                ))
                .bind(Uuid::new_v4())
                .bind(worship_set_id)
                .bind(instrument_id)
                .bind(user_id)
                .bind(AssignmentStatus::Invited.as_str())
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
                invited.push(row);
            }
            AssignmentChange::Reassign {
                assignment_id,
                user_id,
            } => {
                let row = sqlx::query_as::<_, DbAssignment>(&format!(
                    r#"
                    UPDATE assignments
                    SET user_id = $2, status = $3, invited_at = $4, responded_at = NULL
                    WHERE id = $1
                    RETURNING {ASSIGNMENT_COLUMNS}
                    "#
                ))
                .bind(assignment_id)
                .bind(user_id)
                .bind(AssignmentStatus::Invited.as_str())
                .bind(now)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_error)?;
                invited.push(row);
            }
            AssignmentChange::Remove { assignment_id } => {
                sqlx::query("DELETE FROM assignments WHERE id = $1")
                    .bind(assignment_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_error)?;
            }
        }
    }

    let assignments = sqlx::query_as::<_, DbAssignment>(&format!(
        "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE worship_set_id = $1 ORDER BY invited_at ASC"
    ))
    .bind(worship_set_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(db_error)?;

    tracing::debug!(
        "Assignments replaced: worship_set_id={}, changes={}, total={}",
        worship_set_id,
        changes.len(),
        assignments.len()
    );

    Ok(AssignmentReplacement {
        assignments,
        invited,
    })
}
