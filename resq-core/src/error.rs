use thiserror::Error;

use crate::incident::{IncidentId, IncidentStatus};
use crate::subscriptions::WatcherId;

/// Failures surfaced to callers of the registry and the fanout engine.
///
/// None of these are fatal; every one leaves the registry as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncidentError {
    /// No incident with this id is registered.
    #[error("Incident not found: {0}")]
    NotFound(IncidentId),

    /// `create` was called with an id already in use.
    #[error("Incident already exists: {0}")]
    AlreadyExists(IncidentId),

    /// The requested status was rejected. The incident is unchanged.
    #[error("Invalid transition for incident {incident_id}: {rejection}")]
    InvalidTransition {
        /// Incident the request targeted.
        incident_id: IncidentId,
        /// Why it was refused.
        rejection: TransitionRejection,
    },
}

impl IncidentError {
    /// Wrap a rejection for `incident_id`.
    pub fn invalid_transition(
        incident_id: &IncidentId,
        rejection: impl Into<TransitionRejection>,
    ) -> Self {
        Self::InvalidTransition {
            incident_id: incident_id.clone(),
            rejection: rejection.into(),
        }
    }
}

/// Why a status change was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionRejection {
    /// The target precedes the current step.
    #[error("cannot move from `{from}` back to `{to}`")]
    Backward {
        /// Current status.
        from: IncidentStatus,
        /// Requested status.
        to: IncidentStatus,
    },

    /// The wire name matched no step.
    #[error("unknown status `{0}`")]
    UnknownStatus(String),
}

impl From<UnknownStatus> for TransitionRejection {
    fn from(err: UnknownStatus) -> Self {
        TransitionRejection::UnknownStatus(err.0)
    }
}

/// A string that is not one of the six wire names.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

/// A severity label outside `Low`, `Medium`, `High`, `Critical`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity `{0}`")]
pub struct UnknownSeverity(pub String);

/// A push that could not be handed to one watcher. Local to that watcher:
/// logged, counted, and the watcher is unsubscribed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery to watcher {watcher_id} failed: {reason}")]
pub struct DeliveryFailure {
    /// Watcher that could not take the push.
    pub watcher_id: WatcherId,
    /// Why the push failed.
    pub reason: DeliveryFailureReason,
}

/// Cause of a [`DeliveryFailure`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailureReason {
    /// The transport dropped its end of the queue.
    #[error("connection closed")]
    Closed,

    /// The queue is full or its head went unconsumed for too long.
    #[error("watcher queue full")]
    Stalled,
}

/// Result alias for incident operations.
pub type Result<T> = std::result::Result<T, IncidentError>;
