use axum::{
    body::Bytes,
    extract::ws::{Message, Utf8Bytes},
    response::sse::Event,
};
use resq_core::StatusPush;

/// SSE event name carrying a status.
pub const STATUS_EVENT: &str = "status";

/// WebSocket frame for a push: the bare canonical status name.
pub fn status_frame(push: &StatusPush) -> Message {
    Message::Text(Utf8Bytes::from_static(push.status.as_str()))
}

/// SSE event for a push. The event id is the incident revision.
pub fn status_event(push: &StatusPush) -> Event {
    Event::default()
        .event(STATUS_EVENT)
        .id(push.revision.to_string())
        .data(push.status.as_str())
}

pub fn keepalive_ping() -> Message {
    Message::Ping(Bytes::new())
}
