use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::notifications};

pub fn routes() -> Router<Arc<ApiState>> {
    guarded(
        Router::new()
            .route("/notifications", post(notifications::create_notification))
            .route(
                "/notifications/user/:user_id",
                get(notifications::list_for_user),
            )
            .route("/notifications/:id", get(notifications::get_notification))
            .route("/notifications/:id/read", put(notifications::mark_read)),
        Resource::Notification,
    )
}
