use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use worship_core::policy::{Action, Resource};

use super::{guarded, guarded_as};
use crate::{ApiState, handlers::suggestions};

pub fn routes() -> Router<Arc<ApiState>> {
    let suggestions_routes = guarded(
        Router::new()
            .route("/suggestions", post(suggestions::create_suggestion))
            .route("/suggestions/slot/:slot_id", get(suggestions::list_by_slot))
            .route(
                "/suggestions/:id",
                put(suggestions::review_suggestion).delete(suggestions::delete_suggestion),
            ),
        Resource::Suggestion,
    );

    // Approve and reject are reviews, not creations.
    let review = guarded_as(
        Router::new()
            .route("/suggestions/:id/approve", post(suggestions::approve_suggestion))
            .route("/suggestions/:id/reject", post(suggestions::reject_suggestion)),
        Resource::Suggestion,
        Action::Update,
    );

    suggestions_routes.merge(review)
}
