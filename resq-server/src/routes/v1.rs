use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::{AppState, handlers};

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/incidents",
            get(handlers::list_incidents_handler)
                .post(handlers::create_incident_handler),
        )
        .route("/incidents/{incident_id}", get(handlers::get_incident_handler))
        .route(
            "/incidents/{incident_id}/status",
            patch(handlers::update_status_handler),
        )
        .route(
            "/incidents/{incident_id}/events",
            get(handlers::status_events_handler),
        )
        .route(
            "/incidents/{incident_id}/ws",
            get(handlers::status_websocket_handler),
        )
        .route("/reports", post(handlers::report_emergency_handler))
        .route("/sms-fallback", post(handlers::sms_fallback_handler))
}
