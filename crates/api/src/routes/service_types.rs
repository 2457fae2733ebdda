use axum::{Router, routing::get};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::service_types};

pub fn routes() -> Router<Arc<ApiState>> {
    guarded(
        Router::new().route(
            "/service-types",
            get(service_types::list_service_types).post(service_types::create_service_type),
        ),
        Resource::ServiceType,
    )
}
