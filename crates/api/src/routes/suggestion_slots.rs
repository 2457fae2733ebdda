use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use worship_core::policy::{Action, Resource};

use super::{guarded, guarded_as};
use crate::{ApiState, handlers::suggestion_slots};

pub fn routes() -> Router<Arc<ApiState>> {
    let slots = guarded(
        Router::new()
            .route(
                "/suggestion-slots",
                get(suggestion_slots::list_slots).post(suggestion_slots::create_slot),
            )
            .route(
                "/suggestion-slots/set/:set_id",
                get(suggestion_slots::list_slots_by_set),
            )
            .route(
                "/suggestion-slots/:id",
                get(suggestion_slots::get_slot)
                    .put(suggestion_slots::update_slot)
                    .delete(suggestion_slots::delete_slot),
            ),
        Resource::SuggestionSlot,
    );

    let submit = guarded_as(
        Router::new().route(
            "/suggestion-slots/:id/submit",
            post(suggestion_slots::submit_slot),
        ),
        Resource::SuggestionSlot,
        Action::Respond,
    );

    slots.merge(submit)
}
