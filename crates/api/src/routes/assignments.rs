use axum::{
    Router,
    routing::{delete, get, put},
};
use std::sync::Arc;
use worship_core::policy::{Action, Resource};

use super::{guarded, guarded_as};
use crate::{ApiState, handlers::assignments};

pub fn routes() -> Router<Arc<ApiState>> {
    let manage = guarded(
        Router::new()
            .route(
                "/assignments",
                get(assignments::list_assignments).post(assignments::create_assignment),
            )
            .route("/assignments/:id", delete(assignments::delete_assignment)),
        Resource::Assignment,
    );

    // Invited musicians answer with PUT; the handler checks they own the row.
    let respond = guarded_as(
        Router::new().route("/assignments/:id", put(assignments::respond_to_assignment)),
        Resource::Assignment,
        Action::Respond,
    );

    manage.merge(respond)
}
