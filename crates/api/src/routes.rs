pub mod assignments;
pub mod auth;
pub mod health;
pub mod instruments;
pub mod notifications;
pub mod service_types;
pub mod services;
pub mod songs;
pub mod suggestion_slots;
pub mod suggestions;
pub mod users;
pub mod worship_sets;

use axum::{Router, extract::Request, middleware::{Next, from_fn}};
use std::sync::Arc;
use worship_core::policy::{Action, Resource};

use crate::{ApiState, middleware::auth as auth_layer};

/// Runs the policy for `resource` on every route of `router`, with the
/// action taken from the request method.
pub(crate) fn guarded(router: Router<Arc<ApiState>>, resource: Resource) -> Router<Arc<ApiState>> {
    router.route_layer(from_fn(move |req: Request, next: Next| {
        auth_layer::authorize(resource, req, next)
    }))
}

/// Like [`guarded`], for routes whose method does not match what they do.
pub(crate) fn guarded_as(
    router: Router<Arc<ApiState>>,
    resource: Resource,
    action: Action,
) -> Router<Arc<ApiState>> {
    router.route_layer(from_fn(move |req: Request, next: Next| {
        auth_layer::authorize_action(resource, action, req, next)
    }))
}

/// Every route that needs a bearer token. The caller adds the
/// authentication layer on top.
pub fn protected() -> Router<Arc<ApiState>> {
    Router::new()
        .merge(users::routes())
        .merge(songs::routes())
        .merge(service_types::routes())
        .merge(services::routes())
        .merge(worship_sets::routes())
        .merge(suggestion_slots::routes())
        .merge(suggestions::routes())
        .merge(instruments::routes())
        .merge(assignments::routes())
        .merge(notifications::routes())
}
