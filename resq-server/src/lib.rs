//! # ResQ Server
//!
//! HTTP surface of the ResQ emergency service.
//!
//! - **Report intake**: public reports are classified and registered as
//!   incidents.
//! - **Dispatch**: responders move an incident along the step order.
//! - **Live status**: reporters watch an incident over WebSocket or
//!   Server-Sent Events and receive every status change in order, starting
//!   with the current one.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;

use axum::{Router, http::HeaderValue};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the full application router.
pub fn create_app(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state);

    Router::new()
        .merge(routes::create_public_router())
        .merge(routes::legacy::create_legacy_router())
        .merge(routes::create_api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(state)
}

fn build_cors_layer(state: &AppState) -> CorsLayer {
    let cors = &state.config().cors;
    if state.config().dev_mode || cors.is_wildcard_included() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
