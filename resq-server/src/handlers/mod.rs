//! HTTP request handlers organized by functionality

pub mod health;
pub mod incidents;
pub mod reports;
pub mod status_stream;

pub use health::{health_handler, ping_handler};
pub use incidents::{
    create_incident_handler, get_incident_handler, list_incidents_handler,
    update_status_handler,
};
pub use reports::{
    report_emergency_form_handler, report_emergency_handler, sms_fallback_handler,
};
pub use status_stream::{status_events_handler, status_websocket_handler};
