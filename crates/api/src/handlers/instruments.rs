use axum::extract::{Path, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        instrument::{CreateInstrumentRequest, Instrument, UpdateInstrumentRequest},
        response::Deleted,
    },
};
use worship_db::repositories::instruments;

use super::{ApiResult, CreatedResult, created, ok};
use crate::{ApiState, middleware::validation::ValidatedJson};

#[axum::debug_handler]
pub async fn list_instruments(State(state): State<Arc<ApiState>>) -> ApiResult<Vec<Instrument>> {
    let rows = instruments::list_instruments(&state.db_pool)
        .await
        .map_err(WorshipError::Database)?;

    ok(rows.into_iter().map(Instrument::from).collect())
}

#[axum::debug_handler]
pub async fn create_instrument(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateInstrumentRequest>,
) -> CreatedResult<Instrument> {
    let instrument = instruments::create_instrument(&state.db_pool, &payload).await?;

    created(instrument.into())
}

#[axum::debug_handler]
pub async fn get_instrument(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Instrument> {
    let instrument = instruments::get_instrument_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Instrument", id))?;

    ok(instrument.into())
}

#[axum::debug_handler]
pub async fn update_instrument(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateInstrumentRequest>,
) -> ApiResult<Instrument> {
    let instrument = instruments::update_instrument(&state.db_pool, id, &payload)
        .await?
        .ok_or_else(|| WorshipError::not_found("Instrument", id))?;

    ok(instrument.into())
}

#[axum::debug_handler]
pub async fn delete_instrument(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    if !instruments::delete_instrument(&state.db_pool, id).await? {
        return Err(WorshipError::not_found("Instrument", id).into());
    }

    ok(Deleted { deleted: true })
}
