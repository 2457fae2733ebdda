use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::worship_sets};

pub fn routes() -> Router<Arc<ApiState>> {
    let sets = guarded(
        Router::new()
            .route(
                "/worship-sets",
                get(worship_sets::list_worship_sets).post(worship_sets::create_worship_set),
            )
            .route(
                "/worship-sets/:id",
                get(worship_sets::get_worship_set)
                    .put(worship_sets::update_worship_set)
                    .delete(worship_sets::delete_worship_set),
            )
            .route("/worship-sets/:id/songs", post(worship_sets::add_set_song))
            .route(
                "/worship-sets/:id/songs/:set_song_id",
                delete(worship_sets::remove_set_song),
            ),
        Resource::WorshipSet,
    );

    let assignments = guarded(
        Router::new().route(
            "/worship-sets/:id/assignments",
            get(worship_sets::list_set_assignments).put(worship_sets::put_set_assignments),
        ),
        Resource::Assignment,
    );

    sets.merge(assignments)
}
