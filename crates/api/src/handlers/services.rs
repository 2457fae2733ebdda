use axum::extract::{Path, Query, State};
use std::sync::Arc;
use uuid::Uuid;
use worship_core::{
    errors::WorshipError,
    models::{
        assignment::{Assignment, UpsertAssignmentsRequest},
        service::{CreateServiceRequest, Service, ServiceDetail, ServiceQuery, UpdateServiceRequest},
    },
};
use worship_db::{
    models::{DbService, convert_all},
    repositories::{assignments, service_types, services, users, worship_sets},
};

use super::{ApiResult, CreatedResult, assignments::finish_replacement, created, ok};
use crate::{ApiState, middleware::validation::ValidatedJson};

async fn require_service(state: &ApiState, id: Uuid) -> Result<DbService, WorshipError> {
    services::get_service_by_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
        .ok_or_else(|| WorshipError::not_found("Service", id))
}

/// Checks the rows a service points at, so a dangling id is a 404 rather
/// than a foreign key failure.
async fn check_references(
    state: &ApiState,
    service_type_id: Option<Uuid>,
    leader_user_id: Option<Uuid>,
) -> Result<(), WorshipError> {
    if let Some(id) = service_type_id {
        service_types::get_service_type_by_id(&state.db_pool, id)
            .await
            .map_err(WorshipError::Database)?
            .ok_or_else(|| WorshipError::not_found("Service type", id))?;
    }

    if let Some(id) = leader_user_id {
        if !users::user_exists(&state.db_pool, id)
            .await
            .map_err(WorshipError::Database)?
        {
            return Err(WorshipError::not_found("User", id));
        }
    }

    Ok(())
}

#[axum::debug_handler]
pub async fn list_services(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<ServiceQuery>,
) -> ApiResult<Vec<Service>> {
    let rows = services::list_services(&state.db_pool, query.from, query.to)
        .await
        .map_err(WorshipError::Database)?;

    ok(rows.into_iter().map(Service::from).collect())
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<ApiState>>,
    ValidatedJson(payload): ValidatedJson<CreateServiceRequest>,
) -> CreatedResult<Service> {
    check_references(&state, Some(payload.service_type_id), payload.leader_user_id).await?;

    let service = services::create_service(&state.db_pool, &payload)
        .await
        .map_err(WorshipError::Database)?;

    created(service.into())
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<ServiceDetail> {
    let service = require_service(&state, id).await?;
    let worship_set = worship_sets::get_worship_set_by_service_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?;

    ok(ServiceDetail {
        service: service.into(),
        worship_set_id: worship_set.map(|set| set.id),
    })
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateServiceRequest>,
) -> ApiResult<Service> {
    require_service(&state, id).await?;
    check_references(&state, payload.service_type_id, payload.leader_user_id.flatten()).await?;

    let service = services::update_service(&state.db_pool, id, &payload)
        .await
        .map_err(WorshipError::Database)?;

    ok(service.into())
}

/// Instrument assignments of the service's worship set; empty when the
/// service has no set yet.
#[axum::debug_handler]
pub async fn get_service_assignments(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Assignment>> {
    require_service(&state, id).await?;

    let Some(worship_set) = worship_sets::get_worship_set_by_service_id(&state.db_pool, id)
        .await
        .map_err(WorshipError::Database)?
    else {
        return ok(Vec::new());
    };

    let rows = assignments::list_assignments(&state.db_pool, Some(worship_set.id))
        .await
        .map_err(WorshipError::Database)?;

    ok(convert_all(rows)?)
}

/// Bulk-replaces the assignments of the service's worship set, creating a
/// draft set first if the service has none.
#[axum::debug_handler]
pub async fn put_service_assignments(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpsertAssignmentsRequest>,
) -> ApiResult<Vec<Assignment>> {
    let desired = payload.desired()?;
    let replacement = assignments::replace_for_service(&state.db_pool, id, &desired).await?;

    ok(finish_replacement(&state, replacement).await?)
}
