use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use resq_core::{
    IncidentId, IncidentStatus, Result, StatusFanout, StatusPush, Watcher,
    WatcherId,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One live connection watching one incident.
///
/// Owns the watcher's registration: [`WatcherSession::release`] unsubscribes
/// exactly once no matter how many teardown paths call it, and dropping the
/// session releases it too.
pub struct WatcherSession {
    incident_id: IncidentId,
    watcher_id: WatcherId,
    initial_status: IncidentStatus,
    fanout: Arc<StatusFanout>,
    released: AtomicBool,
}

impl fmt::Debug for WatcherSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatcherSession")
            .field("incident_id", &self.incident_id)
            .field("watcher_id", &self.watcher_id)
            .field("initial_status", &self.initial_status)
            .field("released", &self.released.load(Ordering::Relaxed))
            .finish()
    }
}

impl WatcherSession {
    /// Register a new watcher for `incident_id`. The current status is the
    /// first item on the returned receiver.
    pub async fn open(
        fanout: Arc<StatusFanout>,
        incident_id: IncidentId,
        buffer: usize,
    ) -> Result<(Self, mpsc::Receiver<StatusPush>)> {
        let (watcher, rx) = Watcher::channel(buffer);
        let watcher_id = watcher.id();
        let incident = fanout.attach(&incident_id, watcher).await?;

        info!(
            incident_id = %incident_id,
            watcher_id = %watcher_id,
            status = %incident.status,
            "watcher connected"
        );

        let session = Self {
            incident_id,
            watcher_id,
            initial_status: incident.status,
            fanout,
            released: AtomicBool::new(false),
        };
        Ok((session, rx))
    }

    pub fn incident_id(&self) -> &IncidentId {
        &self.incident_id
    }

    pub fn watcher_id(&self) -> WatcherId {
        self.watcher_id
    }

    pub fn initial_status(&self) -> IncidentStatus {
        self.initial_status
    }

    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let removed = self.fanout.detach(&self.incident_id, self.watcher_id);
        debug!(
            incident_id = %self.incident_id,
            watcher_id = %self.watcher_id,
            removed,
            "watcher disconnected"
        );
    }
}

impl Drop for WatcherSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resq_core::Severity;

    #[tokio::test]
    async fn release_is_idempotent_and_runs_on_drop() {
        let fanout = Arc::new(StatusFanout::default());
        let id = IncidentId::from("I-1");
        fanout.create(id.clone(), Severity::Low).unwrap();

        let (session, mut rx) =
            WatcherSession::open(Arc::clone(&fanout), id.clone(), 4)
                .await
                .unwrap();
        assert_eq!(rx.recv().await.unwrap().status, IncidentStatus::Received);
        assert_eq!(fanout.subscriptions().watcher_count(&id), 1);

        session.release();
        session.release();
        assert_eq!(fanout.subscriptions().watcher_count(&id), 0);
        drop(session);

        let (second, _rx) =
            WatcherSession::open(Arc::clone(&fanout), id.clone(), 4)
                .await
                .unwrap();
        assert_eq!(fanout.subscriptions().watcher_count(&id), 1);
        drop(second);
        assert_eq!(fanout.subscriptions().watcher_count(&id), 0);
    }
}
