//! Route definitions.
//!
//! - `/ping`, `/health`: liveness
//! - `/api/v1/...`: versioned API
//! - unversioned paths used by the existing web and mobile clients

pub mod legacy;
pub mod v1;

use axum::{Router, routing::get};

use crate::{
    AppState,
    handlers::{health_handler, ping_handler},
};

pub fn create_public_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
}

pub fn create_api_router() -> Router<AppState> {
    Router::new().nest("/api/v1", v1::create_v1_router())
}
