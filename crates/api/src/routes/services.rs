use axum::{Router, routing::get};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::services};

pub fn routes() -> Router<Arc<ApiState>> {
    let services = guarded(
        Router::new()
            .route("/services", get(services::list_services).post(services::create_service))
            .route(
                "/services/:id",
                get(services::get_service).put(services::update_service),
            ),
        Resource::Service,
    );

    let assignments = guarded(
        Router::new().route(
            "/services/:id/assignments",
            get(services::get_service_assignments).put(services::put_service_assignments),
        ),
        Resource::Assignment,
    );

    services.merge(assignments)
}
