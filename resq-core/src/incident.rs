use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TransitionRejection, UnknownSeverity, UnknownStatus};

/// Opaque incident identifier, immutable once assigned.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IncidentId(String);

impl IncidentId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Time-ordered identifier for incidents created by report intake.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IncidentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IncidentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Canonical step order of an incident.
///
/// Declaration order is the step order, so the derived `Ord` is the
/// transition order. The serde names are the wire strings clients match on
/// and must not change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
)]
pub enum IncidentStatus {
    /// Initial step.
    #[default]
    #[serde(rename = "Request Received")]
    Received,
    /// Responders are being assigned.
    #[serde(rename = "Preparing")]
    Preparing,
    /// Responders assigned.
    #[serde(rename = "Team Dispatched")]
    Dispatched,
    /// Responders travelling to the scene.
    #[serde(rename = "On the Way")]
    EnRoute,
    /// Responders on scene.
    #[serde(rename = "Action in Progress")]
    InProgress,
    /// Terminal step.
    #[serde(rename = "Resolved")]
    Resolved,
}

impl IncidentStatus {
    /// Every step, first to last.
    pub const STEP_ORDER: [IncidentStatus; 6] = [
        IncidentStatus::Received,
        IncidentStatus::Preparing,
        IncidentStatus::Dispatched,
        IncidentStatus::EnRoute,
        IncidentStatus::InProgress,
        IncidentStatus::Resolved,
    ];

    /// Position in [`IncidentStatus::STEP_ORDER`].
    pub const fn step_index(self) -> usize {
        self as usize
    }

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Received => "Request Received",
            IncidentStatus::Preparing => "Preparing",
            IncidentStatus::Dispatched => "Team Dispatched",
            IncidentStatus::EnRoute => "On the Way",
            IncidentStatus::InProgress => "Action in Progress",
            IncidentStatus::Resolved => "Resolved",
        }
    }

    /// No step follows.
    pub const fn is_terminal(self) -> bool {
        matches!(self, IncidentStatus::Resolved)
    }

    /// Forward jumps and same-status re-pushes are admitted; anything earlier
    /// in the step order is not.
    pub fn admits(self, next: IncidentStatus) -> bool {
        next >= self
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::STEP_ORDER
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Severity label produced by the analysis step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Severity {
    /// Minor or non-urgent.
    Low,
    /// Default for plain reports.
    Medium,
    /// Media attached or danger indicated.
    High,
    /// Immediate threat to life.
    Critical,
}

impl Severity {
    /// Wire label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Severity::Low),
            "Medium" => Ok(Severity::Medium),
            "High" => Ok(Severity::High),
            "Critical" => Ok(Severity::Critical),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

/// What the reporter submitted plus the analysis summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDetails {
    /// Reporter's account.
    pub description: String,
    /// WGS84 degrees.
    pub latitude: f64,
    /// WGS84 degrees.
    pub longitude: f64,
    /// Comma-separated responder types.
    pub detected_type: String,
    /// Alert line shown to dispatchers.
    pub summary_message: String,
    /// Media was attached to the report.
    pub has_media: bool,
}

/// Authoritative record of one incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Fixed at creation.
    pub id: IncidentId,
    /// Current lifecycle step.
    pub status: IncidentStatus,
    /// Set at creation.
    pub severity: Severity,
    /// Bumped on every transition that changes `status`.
    pub revision: u64,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Time of the last transition that changed the status.
    pub updated_at: DateTime<Utc>,
    /// Present when the incident came in through report intake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportDetails>,
}

impl Incident {
    /// New incident at [`IncidentStatus::Received`].
    pub fn new(id: IncidentId, severity: Severity) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: IncidentStatus::default(),
            severity,
            revision: 0,
            created_at: now,
            updated_at: now,
            report: None,
        }
    }

    /// Attach the intake details.
    pub fn with_report(mut self, report: ReportDetails) -> Self {
        self.report = Some(report);
        self
    }

    /// Move to `next` if the step order allows it. The record is untouched on
    /// rejection and on a same-status re-push.
    pub fn advance_to(
        &mut self,
        next: IncidentStatus,
    ) -> Result<Transition, TransitionRejection> {
        let from = self.status;
        if !from.admits(next) {
            return Err(TransitionRejection::Backward { from, to: next });
        }

        if next != from {
            self.status = next;
            self.revision += 1;
            self.updated_at = Utc::now();
        }

        Ok(Transition { from, to: next })
    }
}

/// An accepted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status before the change.
    pub from: IncidentStatus,
    /// Status after the change.
    pub to: IncidentStatus,
}

impl Transition {
    /// `false` for an equal-status re-push.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// Steps passed over without being reported individually.
    pub fn skipped(&self) -> &'static [IncidentStatus] {
        let start = (self.from.step_index() + 1).min(self.to.step_index());
        &IncidentStatus::STEP_ORDER[start..self.to.step_index()]
    }
}
