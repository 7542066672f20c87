//! Router for the generic resource routes

use crate::server::handlers::{
    ApiState, create_resource, destroy_resource, health, list_resources, panic_responder,
    show_resource, update_resource, url_not_found,
};
use axum::{Router, routing::get};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Build the resource routes
///
/// These routes are generic and serve every registered resource:
/// - GET /health - Liveness check, no authentication
/// - GET /{resource} - List (search) records
/// - POST /{resource} - Create a record
/// - GET /{resource}/{id} - Show a record
/// - PUT|PATCH /{resource}/{id} - Update a record
/// - DELETE /{resource}/{id} - Destroy a record
///
/// A panic while serving any of them is reported and answered with the
/// generic application error.
pub fn build_resource_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/{resource}", get(list_resources).post(create_resource))
        .route(
            "/{resource}/{id}",
            get(show_resource)
                .put(update_resource)
                .patch(update_resource)
                .delete(destroy_resource),
        )
        .fallback(url_not_found)
        .layer(CatchPanicLayer::custom(panic_responder(state.reporter.clone())))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
