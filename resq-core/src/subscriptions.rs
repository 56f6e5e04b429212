use dashmap::DashMap;
use std::{collections::HashMap, fmt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{DeliveryFailure, DeliveryFailureReason},
    incident::{Incident, IncidentId, IncidentStatus},
};

/// Identity of one watcher, unique per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(Uuid);

impl WatcherId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for WatcherId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One status message queued for a watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPush {
    /// Incident the push is about.
    pub incident_id: IncidentId,
    /// Status after the transition.
    pub status: IncidentStatus,
    /// Incident revision after the transition. Increases with each change.
    pub revision: u64,
}

impl From<&Incident> for StatusPush {
    fn from(incident: &Incident) -> Self {
        Self {
            incident_id: incident.id.clone(),
            status: incident.status,
            revision: incident.revision,
        }
    }
}

/// Engine-side handle of a live connection.
///
/// The transport owns the receiving half and relays what arrives. Pushing
/// never waits: a full queue means the consumer is not keeping up.
#[derive(Clone)]
pub struct Watcher {
    id: WatcherId,
    sender: mpsc::Sender<StatusPush>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.id)
            .field("channel_closed", &self.sender.is_closed())
            .field("capacity", &self.sender.capacity())
            .finish()
    }
}

impl Watcher {
    /// Watcher that queues pushes into `sender`.
    pub fn new(sender: mpsc::Sender<StatusPush>) -> Self {
        Self {
            id: WatcherId::new(),
            sender,
        }
    }

    /// Watcher plus the receiving end of its queue. `buffer` is clamped to 1.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<StatusPush>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    /// Id assigned at construction.
    pub fn id(&self) -> WatcherId {
        self.id
    }

    /// The transport has dropped the receiving half.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue `push` without waiting.
    pub fn push(&self, push: StatusPush) -> Result<(), DeliveryFailure> {
        self.sender.try_send(push).map_err(|err| {
            let reason = match err {
                TrySendError::Full(_) => DeliveryFailureReason::Stalled,
                TrySendError::Closed(_) => DeliveryFailureReason::Closed,
            };
            DeliveryFailure {
                watcher_id: self.id,
                reason,
            }
        })
    }
}

/// Live watchers per incident.
///
/// Add and remove take only the shard holding that incident; reads hand out
/// a copy so fanout iterates without holding any lock.
#[derive(Default)]
pub struct SubscriptionManager {
    incidents: DashMap<IncidentId, HashMap<WatcherId, Watcher>>,
}

impl fmt::Debug for SubscriptionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionManager")
            .field("watched_incidents", &self.incidents.len())
            .field("watcher_count", &self.total_watchers())
            .finish()
    }
}

impl SubscriptionManager {
    /// Manager with no watchers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the watcher was already registered, in which case
    /// nothing changes.
    pub fn subscribe(&self, incident_id: &IncidentId, watcher: Watcher) -> bool {
        let mut watchers = self.incidents.entry(incident_id.clone()).or_default();
        if watchers.contains_key(&watcher.id) {
            return false;
        }
        debug!(incident_id = %incident_id, watcher_id = %watcher.id, "watcher subscribed");
        watchers.insert(watcher.id, watcher);
        true
    }

    /// Safe to call for watchers that are already gone.
    pub fn unsubscribe(&self, incident_id: &IncidentId, watcher_id: WatcherId) -> bool {
        let removed = self
            .incidents
            .get_mut(incident_id)
            .map(|mut watchers| watchers.remove(&watcher_id).is_some())
            .unwrap_or(false);

        // Clean up empty set
        self.incidents
            .remove_if(incident_id, |_, watchers| watchers.is_empty());

        if removed {
            debug!(incident_id = %incident_id, watcher_id = %watcher_id, "watcher unsubscribed");
        }
        removed
    }

    /// Copy of the watchers registered right now.
    pub fn watchers_of(&self, incident_id: &IncidentId) -> Vec<Watcher> {
        self.incidents
            .get(incident_id)
            .map(|watchers| watchers.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Watchers registered on `incident_id`.
    pub fn watcher_count(&self, incident_id: &IncidentId) -> usize {
        self.incidents
            .get(incident_id)
            .map(|watchers| watchers.len())
            .unwrap_or(0)
    }

    /// Watchers across all incidents.
    pub fn total_watchers(&self) -> usize {
        self.incidents.iter().map(|entry| entry.value().len()).sum()
    }

    /// Incidents with at least one watcher.
    pub fn watched_incidents(&self) -> usize {
        self.incidents.len()
    }
}
