use std::{convert::Infallible, fmt, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{
        Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures_util::{Sink, SinkExt, Stream, StreamExt, stream};
use resq_config::MAX_FANOUT_INTERVAL;
use resq_core::{IncidentId, StatusPush};
use tokio::{
    sync::mpsc,
    time::{Instant, interval_at, timeout},
};
use tracing::{debug, warn};

use crate::{
    AppState,
    infra::{
        errors::AppResult,
        transport::{WatcherSession, keepalive_ping, status_event, status_frame},
    },
};

/// Upgrade to a status socket for one incident.
///
/// The watcher is registered before the upgrade so an unknown incident is
/// answered with a plain 404.
pub async fn status_websocket_handler(
    ws: WebSocketUpgrade,
    Path(incident_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Response> {
    let fanout = &state.config().fanout;
    let push_timeout = fanout.push_timeout;
    let keepalive = fanout.keepalive_interval;

    let (session, rx) = WatcherSession::open(
        Arc::clone(state.fanout()),
        IncidentId::from(incident_id),
        fanout.watcher_buffer,
    )
    .await?;

    Ok(ws.on_upgrade(move |socket: WebSocket| {
        let (sink, stream) = socket.split();
        drive_socket(sink, stream, session, rx, push_timeout, keepalive)
    }))
}

/// Run one watcher connection until either side gives up, then release the
/// watcher.
async fn drive_socket<S, R, E>(
    sink: S,
    mut stream: R,
    session: WatcherSession,
    rx: mpsc::Receiver<StatusPush>,
    push_timeout: Duration,
    keepalive: Duration,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let mut send_task =
        tokio::spawn(relay_pushes(sink, rx, push_timeout, keepalive));

    // Client frames carry no commands; the read side only detects hang-ups.
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(err) => {
                    debug!(error = %err, "websocket receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        relayed = &mut send_task => {
            recv_task.abort();
            if let Ok(Err(err)) = relayed {
                warn!(
                    incident_id = %session.incident_id(),
                    watcher_id = %session.watcher_id(),
                    error = %err,
                    "status relay stopped"
                );
            }
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    session.release();
}

/// Forward queued pushes to the socket until the queue closes or a write
/// fails. The queue closes when the engine evicts this watcher.
async fn relay_pushes<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<StatusPush>,
    push_timeout: Duration,
    keepalive: Duration,
) -> anyhow::Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let keepalive = keepalive.min(MAX_FANOUT_INTERVAL);
    let mut heartbeat = interval_at(Instant::now() + keepalive, keepalive);

    loop {
        let message = tokio::select! {
            push = rx.recv() => match push {
                Some(push) => status_frame(&push),
                None => break,
            },
            _ = heartbeat.tick() => keepalive_ping(),
        };

        timeout(push_timeout, sink.send(message))
            .await
            .context("websocket write timed out")?
            .context("websocket write failed")?;
    }

    let _ = sink.close().await;
    Ok(())
}

/// Server-Sent Events variant of the status stream.
///
/// A relay task moves pushes into the response body one at a time. An event
/// the body has not taken within `push_timeout` ends the relay, which
/// unsubscribes the watcher and lets the stream finish.
pub async fn status_events_handler(
    Path(incident_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let fanout = &state.config().fanout;
    let push_timeout = fanout.push_timeout;
    let keepalive = fanout.keepalive_interval.min(MAX_FANOUT_INTERVAL);

    let (session, rx) = WatcherSession::open(
        Arc::clone(state.fanout()),
        IncidentId::from(incident_id),
        fanout.watcher_buffer,
    )
    .await?;

    let (events_tx, events_rx) = mpsc::channel(1);
    tokio::spawn(relay_events(session, rx, events_tx, push_timeout));

    let events = stream::unfold(events_rx, |mut events_rx| async move {
        let event = events_rx.recv().await?;
        Some((Ok(event), events_rx))
    });

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new().interval(keepalive).text("keepalive"),
    ))
}

async fn relay_events(
    session: WatcherSession,
    mut rx: mpsc::Receiver<StatusPush>,
    events: mpsc::Sender<Event>,
    push_timeout: Duration,
) {
    loop {
        let push = tokio::select! {
            push = rx.recv() => match push {
                Some(push) => push,
                None => break,
            },
            _ = events.closed() => break,
        };

        let handed_off = timeout(push_timeout, async {
            events.send(status_event(&push)).await.ok()?;
            // The single slot frees once the body has taken the event.
            events.reserve().await.ok().map(drop)
        })
        .await;

        match handed_off {
            Ok(Some(())) => {}
            Ok(None) => break,
            Err(_) => {
                warn!(
                    incident_id = %session.incident_id(),
                    watcher_id = %session.watcher_id(),
                    timeout = ?push_timeout,
                    "event stream not consumed, dropping watcher"
                );
                break;
            }
        }
    }

    session.release();
}
