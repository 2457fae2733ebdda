use axum::{Router, routing::get};
use std::sync::Arc;
use worship_core::policy::Resource;

use super::guarded;
use crate::{ApiState, handlers::songs};

pub fn routes() -> Router<Arc<ApiState>> {
    guarded(
        Router::new()
            .route("/songs", get(songs::list_songs).post(songs::create_song))
            .route(
                "/songs/:id",
                get(songs::get_song)
                    .put(songs::update_song)
                    .delete(songs::delete_song),
            )
            .route(
                "/songs/:id/versions",
                get(songs::list_versions).post(songs::create_version),
            ),
        Resource::Song,
    )
}
