use axum::extract::State;
use std::sync::Arc;
use worship_core::{
    errors::WorshipError,
    models::service::{CreateServiceTypeRequest, ServiceType},
};
use worship_db::repositories::service_types;

use super::{ApiResult, CreatedResult, created, ok};
use crate::{ApiState, middleware::validation::ValidatedJson};

#[axum::debug_handler]
pub async fn list_service_types(State(state): State<Arc<ApiState>>) -> ApiResult<Vec<ServiceType>> {
    let rows = service_types::list_service_types(&state.db_pool)
        .await
        .map_err(WorshipError::Database)?;

    ok(rows.into_iter().map(ServiceType::from).collect())
}

#[axum::debug_handler]
pub async fn create_service_type(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateServiceTypeRequest>,
) -> CreatedResult<ServiceType> {
    let service_type = service_types::create_service_type(&state.db_pool, payload.name.trim()).await?;

    created(service_type.into())
}
