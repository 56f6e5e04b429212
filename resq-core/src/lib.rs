//! # ResQ Core
//!
//! Incident status notification core for the ResQ emergency reporting
//! service.
//!
//! ## Overview
//!
//! - **Incident Registry**: authoritative status and metadata per incident,
//!   with exclusive access per incident id.
//! - **Subscription Manager**: the live watchers of each incident, read as a
//!   snapshot during fanout.
//! - **Status Fanout Engine**: validates a transition against the step order,
//!   applies it and pushes the new status to every watcher in order.
//! - **Report intake**: turns a submitted report into a registered incident
//!   using a pluggable [`IncidentAnalyzer`].
//!
//! Nothing in this crate knows about sockets. Transports hand the engine a
//! [`Watcher`] (a bounded queue) and relay whatever arrives on it.

/// Report classification.
pub mod analysis;
/// Error types.
pub mod error;
/// Status Fanout Engine.
pub mod fanout;
/// Incident model and status lifecycle.
pub mod incident;
/// Report intake.
pub mod intake;
/// Incident Registry.
pub mod registry;
/// Subscription Manager.
pub mod subscriptions;

pub use analysis::{
    EmergencyType, IncidentAnalyzer, KeywordAnalyzer, ReportAnalysis,
    ReportSubmission,
};
pub use error::{
    DeliveryFailure, DeliveryFailureReason, IncidentError, Result,
    TransitionRejection, UnknownSeverity, UnknownStatus,
};
pub use fanout::{StatusFanout, TransitionOutcome};
pub use incident::{
    Incident, IncidentId, IncidentStatus, ReportDetails, Severity, Transition,
};
pub use intake::{IntakeReceipt, ReportIntake};
pub use registry::{IncidentGuard, IncidentRegistry};
pub use subscriptions::{StatusPush, SubscriptionManager, Watcher, WatcherId};
