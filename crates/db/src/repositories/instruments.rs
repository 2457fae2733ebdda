use crate::{conflict_or_db, db_error, models::DbInstrument};
use chrono::Utc;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;
use worship_core::{
    errors::{WorshipError, WorshipResult},
    models::instrument::{CreateInstrumentRequest, UpdateInstrumentRequest},
};

const INSTRUMENT_COLUMNS: &str = "id, code, name, display_order, created_at";

pub async fn list_instruments(pool: &Pool<Postgres>) -> Result<Vec<DbInstrument>> {
    let instruments = sqlx::query_as::<_, DbInstrument>(&format!(
        "SELECT {INSTRUMENT_COLUMNS} FROM instruments ORDER BY display_order ASC, name ASC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(instruments)
}

pub async fn get_instrument_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbInstrument>> {
    let instrument = sqlx::query_as::<_, DbInstrument>(&format!(
        "SELECT {INSTRUMENT_COLUMNS} FROM instruments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(instrument)
}

pub async fn create_instrument(
    pool: &Pool<Postgres>,
    request: &CreateInstrumentRequest,
) -> WorshipResult<DbInstrument> {
    sqlx::query_as::<_, DbInstrument>(&format!(
        r#"
        INSERT INTO instruments (id, code, name, display_order, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {INSTRUMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&request.code)
    .bind(&request.name)
    .bind(request.display_order)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_or_db(e, format!("Instrument code {} is already taken", request.code)))
}

/// Returns `None` if the instrument does not exist.
pub async fn update_instrument(
    pool: &Pool<Postgres>,
    id: Uuid,
    request: &UpdateInstrumentRequest,
) -> WorshipResult<Option<DbInstrument>> {
    let Some(current) = get_instrument_by_id(pool, id).await? else {
        return Ok(None);
    };

    let code = request.code.clone().unwrap_or(current.code);
    sqlx::query_as::<_, DbInstrument>(&format!(
        r#"
        UPDATE instruments
        SET code = $2, name = $3, display_order = $4
        WHERE id = $1
        RETURNING {INSTRUMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&code)
    .bind(request.name.as_ref().unwrap_or(&current.name))
    .bind(request.display_order.unwrap_or(current.display_order))
    .fetch_one(pool)
    .await
    .map(Some)
    .map_err(|e| conflict_or_db(e, format!("Instrument code {} is already taken", code)))
}

/// Refused with a conflict while assignments reference the instrument.
pub async fn delete_instrument(pool: &Pool<Postgres>, id: Uuid) -> WorshipResult<bool> {
    let mut tx = pool.begin().await.map_err(db_error)?;

    let in_use = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM assignments WHERE instrument_id = $1)",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error)?;
    if in_use {
        return Err(WorshipError::Conflict(
            "Instrument is assigned in a worship set".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM instruments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

    tx.commit().await.map_err(db_error)?;
    Ok(result.rows_affected() > 0)
}
