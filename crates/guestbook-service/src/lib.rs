//! Guestbook REST service
//!
//! Provides:
//! - Entry list/get/create/delete under `/api/guestbook`
//! - Health and info endpoints under `/actuator`
//! - Per-namespace cross-origin policy; unknown origins get a 403
//!
//! The router is stateless between requests; all entries live in the
//! [`EntryRepository`] handed to [`AppState`].

pub mod api;
pub mod config;
pub mod cors;
pub mod error;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use guestbook_store::EntryRepository;
use tower_http::trace::TraceLayer;

use crate::cors::CorsPolicy;

/// Shared application state
pub struct AppState {
    pub repository: Arc<dyn EntryRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn EntryRepository>) -> Self {
        Self { repository }
    }
}

/// Build the full router with CORS and request tracing applied.
pub fn router(state: Arc<AppState>, cors: &CorsPolicy) -> Router {
    let api: Router<Arc<AppState>> = Router::new()
        .route(
            "/api/guestbook",
            get(api::guestbook::list).post(api::guestbook::create),
        )
        .route(
            "/api/guestbook/{id}",
            get(api::guestbook::get_entry).delete(api::guestbook::delete),
        )
        .layer(cors.api_layer())
        .layer(middleware::from_fn_with_state(
            cors.clone(),
            cors::reject_disallowed_origin,
        ));

    let actuator: Router<Arc<AppState>> = Router::new()
        .route("/actuator/health", get(api::actuator::health))
        .route("/actuator/info", get(api::actuator::info))
        .layer(cors.actuator_layer())
        .layer(middleware::from_fn_with_state(
            cors.clone(),
            cors::reject_disallowed_origin,
        ));

    Router::new()
        .merge(api)
        .merge(actuator)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
