//! Unversioned paths kept for clients that predate `/api/v1`.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{MethodRouter, get, patch, post},
};

use crate::{AppState, handlers};

/// Photos and voice notes ride along with the form.
const REPORT_FORM_LIMIT: usize = 25 * 1024 * 1024;

pub fn create_legacy_router() -> Router<AppState> {
    Router::new()
        .route("/report", report_form())
        .route("/report/", report_form())
        .route("/sms-fallback", post(handlers::sms_fallback_handler))
        .route("/sms-fallback/", post(handlers::sms_fallback_handler))
        .route("/incidents", get(handlers::list_incidents_handler))
        .route("/incidents/", get(handlers::list_incidents_handler))
        .route(
            "/incidents/{incident_id}/status",
            patch(handlers::update_status_handler),
        )
        .route(
            "/ws/status/{incident_id}",
            get(handlers::status_websocket_handler),
        )
}

fn report_form() -> MethodRouter<AppState> {
    post(handlers::report_emergency_form_handler)
        .layer(DefaultBodyLimit::max(REPORT_FORM_LIMIT))
}
