use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::incident::Severity;

/// A report as submitted by the public form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSubmission {
    /// Free-text account from the reporter.
    pub description: String,
    /// WGS84 degrees.
    pub latitude: f64,
    /// WGS84 degrees.
    pub longitude: f64,
    /// Photos or audio were attached. Only used to estimate severity.
    #[serde(default)]
    pub has_media: bool,
}

/// Result of classifying one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAnalysis {
    /// Comma-separated responder types, e.g. `"Fire Station, Ambulance"`.
    pub detected_type: String,
    /// Estimated urgency.
    pub severity: Severity,
    /// One-line alert for dispatchers.
    pub summary_message: String,
}

/// Responder service a report calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmergencyType {
    /// Crime, violence or a threat to people.
    Police,
    /// Medical emergency.
    Ambulance,
    /// Fire, smoke or explosion.
    #[serde(rename = "Fire Station")]
    Fire,
    /// Nothing more specific matched.
    General,
}

impl EmergencyType {
    /// Display name, as shown to dispatchers.
    pub const fn as_str(self) -> &'static str {
        match self {
            EmergencyType::Police => "Police",
            EmergencyType::Ambulance => "Ambulance",
            EmergencyType::Fire => "Fire Station",
            EmergencyType::General => "General",
        }
    }
}

impl fmt::Display for EmergencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification step run on every new report.
#[async_trait]
pub trait IncidentAnalyzer: Send + Sync {
    async fn analyze(&self, report: &ReportSubmission) -> ReportAnalysis;
}

const FIRE_KEYWORDS: &[&str] = &["fire", "smoke", "burn"];
const AMBULANCE_KEYWORDS: &[&str] = &["blood", "hurt", "pain", "car"];
const POLICE_KEYWORDS: &[&str] = &["gun", "fight", "thief", "attack"];
const CRITICAL_KEYWORDS: &[&str] = &["dead", "critical", "gun", "massive"];
const LOW_KEYWORDS: &[&str] = &["low", "minor"];

const SUMMARY_EXCERPT_CHARS: usize = 50;

/// Keyword matcher used when no external classifier is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    /// Classify without going through the async trait.
    pub fn classify(&self, report: &ReportSubmission) -> ReportAnalysis {
        let text = report.description.to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

        let mut categories = Vec::new();
        if mentions(FIRE_KEYWORDS) {
            categories.push(EmergencyType::Fire);
        }
        if mentions(AMBULANCE_KEYWORDS) {
            categories.push(EmergencyType::Ambulance);
        }
        if mentions(POLICE_KEYWORDS) {
            categories.push(EmergencyType::Police);
        }
        if categories.is_empty() {
            categories.push(EmergencyType::General);
        }

        let severity = if mentions(CRITICAL_KEYWORDS) {
            Severity::Critical
        } else if mentions(LOW_KEYWORDS) {
            Severity::Low
        } else if report.has_media {
            Severity::High
        } else {
            Severity::Medium
        };

        let detected_type = categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let excerpt: String = report
            .description
            .chars()
            .take(SUMMARY_EXCERPT_CHARS)
            .collect();
        let summary_message = format!(
            "[{}] ALERT: {} required. Severity: {}. Report: {}...",
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            detected_type,
            severity,
            excerpt
        );

        ReportAnalysis {
            detected_type,
            severity,
            summary_message,
        }
    }
}

#[async_trait]
impl IncidentAnalyzer for KeywordAnalyzer {
    async fn analyze(&self, report: &ReportSubmission) -> ReportAnalysis {
        self.classify(report)
    }
}
