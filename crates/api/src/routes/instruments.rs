use axum::{Router, routing::get};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::instruments};

pub fn routes() -> Router<Arc<ApiState>> {
    guarded(
        Router::new()
            .route(
                "/instruments",
                get(instruments::list_instruments).post(instruments::create_instrument),
            )
            .route(
                "/instruments/:id",
                get(instruments::get_instrument)
                    .put(instruments::update_instrument)
                    .delete(instruments::delete_instrument),
            ),
        Resource::Instrument,
    )
}
