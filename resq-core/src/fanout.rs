use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

use crate::{
    error::{DeliveryFailure, IncidentError, Result},
    incident::{Incident, IncidentId, IncidentStatus, Severity},
    registry::IncidentRegistry,
    subscriptions::{StatusPush, SubscriptionManager, Watcher, WatcherId},
};

/// Result of one accepted transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// Record as of the transition.
    pub incident: Incident,
    /// Status before this transition.
    pub previous: IncidentStatus,
    /// `false` for a same-status re-push.
    pub changed: bool,
    /// Watchers the status was queued for.
    pub delivered: usize,
    /// Watchers dropped because the push could not be queued.
    pub dropped: Vec<DeliveryFailure>,
}

/// Applies status transitions and pushes them to the incident's watchers.
///
/// A transition holds the incident's record for the whole
/// validate-mutate-enqueue step, and so does attaching a watcher. That is
/// what keeps every watcher's queue in transition order and makes the
/// late-joiner push land before any later transition. Enqueueing never
/// blocks, so the record is held only briefly.
#[derive(Clone)]
pub struct StatusFanout {
    registry: Arc<IncidentRegistry>,
    subscriptions: Arc<SubscriptionManager>,
}

impl fmt::Debug for StatusFanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusFanout")
            .field("registry", &self.registry)
            .field("subscriptions", &self.subscriptions)
            .finish()
    }
}

impl Default for StatusFanout {
    fn default() -> Self {
        Self::new(
            Arc::new(IncidentRegistry::new()),
            Arc::new(SubscriptionManager::new()),
        )
    }
}

impl StatusFanout {
    /// Engine over an existing registry and subscription set.
    pub fn new(
        registry: Arc<IncidentRegistry>,
        subscriptions: Arc<SubscriptionManager>,
    ) -> Self {
        Self {
            registry,
            subscriptions,
        }
    }

    /// Registry the engine mutates.
    pub fn registry(&self) -> &Arc<IncidentRegistry> {
        &self.registry
    }

    /// Watchers the engine delivers to.
    pub fn subscriptions(&self) -> &Arc<SubscriptionManager> {
        &self.subscriptions
    }

    /// Register a new incident. Same as [`IncidentRegistry::create`].
    pub fn create(&self, id: IncidentId, severity: Severity) -> Result<Incident> {
        self.registry.create(id, severity)
    }

    /// Validate and apply `status`, then push the result to every current
    /// watcher of the incident.
    ///
    /// The incident stays locked until every push is queued, so each watcher
    /// sees transitions in the order they were applied. Watchers that cannot
    /// take the push are unsubscribed and listed in
    /// [`TransitionOutcome::dropped`]; they never fail the call.
    pub async fn apply_transition(
        &self,
        incident_id: &IncidentId,
        new_status: IncidentStatus,
    ) -> Result<TransitionOutcome> {
        let mut incident = self.registry.lock(incident_id).await?;

        let transition = incident.advance_to(new_status).map_err(|rejection| {
            warn!(
                incident_id = %incident_id,
                current = %incident.status,
                requested = %new_status,
                "rejected status transition"
            );
            IncidentError::invalid_transition(incident_id, rejection)
        })?;

        let push = StatusPush::from(&*incident);
        let watchers = self.subscriptions.watchers_of(incident_id);
        let (delivered, dropped) = self.deliver(incident_id, &watchers, &push);
        let snapshot = incident.clone();
        drop(incident);

        info!(
            incident_id = %incident_id,
            from = %transition.from,
            to = %transition.to,
            changed = transition.changed(),
            delivered,
            dropped = dropped.len(),
            "status transition applied"
        );

        Ok(TransitionOutcome {
            incident: snapshot,
            previous: transition.from,
            changed: transition.changed(),
            delivered,
            dropped,
        })
    }

    /// Same as [`StatusFanout::apply_transition`] for a wire status name.
    /// Unknown names are an invalid transition, never a default.
    pub async fn apply_transition_str(
        &self,
        incident_id: &IncidentId,
        raw_status: &str,
    ) -> Result<TransitionOutcome> {
        let status = raw_status.parse::<IncidentStatus>().map_err(|err| {
            warn!(incident_id = %incident_id, status = raw_status, "unknown status requested");
            IncidentError::invalid_transition(incident_id, err)
        })?;
        self.apply_transition(incident_id, status).await
    }

    /// Subscribe `watcher` and queue the current status for it.
    ///
    /// Re-attaching a registered watcher is a no-op and queues nothing.
    pub async fn attach(
        &self,
        incident_id: &IncidentId,
        watcher: Watcher,
    ) -> Result<Incident> {
        let incident = self.registry.lock(incident_id).await?;

        if self.subscriptions.subscribe(incident_id, watcher.clone()) {
            match watcher.push(StatusPush::from(&*incident)) {
                Ok(()) => debug!(
                    incident_id = %incident_id,
                    watcher_id = %watcher.id(),
                    status = %incident.status,
                    "queued current status for new watcher"
                ),
                Err(failure) => self.drop_watcher(incident_id, &failure),
            }
        }

        Ok(incident.clone())
    }

    /// Unsubscribe a watcher. Returns `false` if it was not registered.
    pub fn detach(&self, incident_id: &IncidentId, watcher_id: WatcherId) -> bool {
        self.subscriptions.unsubscribe(incident_id, watcher_id)
    }

    fn deliver(
        &self,
        incident_id: &IncidentId,
        watchers: &[Watcher],
        push: &StatusPush,
    ) -> (usize, Vec<DeliveryFailure>) {
        let mut delivered = 0;
        let mut dropped = Vec::new();

        for watcher in watchers {
            match watcher.push(push.clone()) {
                Ok(()) => delivered += 1,
                Err(failure) => {
                    self.drop_watcher(incident_id, &failure);
                    dropped.push(failure);
                }
            }
        }

        (delivered, dropped)
    }

    fn drop_watcher(&self, incident_id: &IncidentId, failure: &DeliveryFailure) {
        warn!(
            incident_id = %incident_id,
            watcher_id = %failure.watcher_id,
            reason = %failure.reason,
            "dropping watcher after failed push"
        );
        self.subscriptions
            .unsubscribe(incident_id, failure.watcher_id);
    }
}
