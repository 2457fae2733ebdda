use axum::{Router, routing::get};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::users};

pub fn routes() -> Router<Arc<ApiState>> {
    guarded(
        Router::new()
            .route("/users/me", get(users::me))
            .route("/users", get(users::list_users).post(users::create_user)),
        Resource::User,
    )
}
