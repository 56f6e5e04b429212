use std::{fmt, sync::Arc};
use tracing::{info, warn};

use crate::{
    analysis::{IncidentAnalyzer, ReportAnalysis, ReportSubmission},
    error::Result,
    incident::{Incident, IncidentId, ReportDetails, Severity},
    registry::IncidentRegistry,
};

/// What intake produced for one report.
#[derive(Debug, Clone)]
pub struct IntakeReceipt {
    /// The registered incident.
    pub incident: Incident,
    /// Classification the incident was created from.
    pub analysis: ReportAnalysis,
}

/// Accepts public reports: classify, then register at the first step.
#[derive(Clone)]
pub struct ReportIntake {
    analyzer: Arc<dyn IncidentAnalyzer>,
    registry: Arc<IncidentRegistry>,
}

impl fmt::Debug for ReportIntake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportIntake").finish_non_exhaustive()
    }
}

impl ReportIntake {
    /// Intake that classifies with `analyzer` and registers into `registry`.
    pub fn new(
        analyzer: Arc<dyn IncidentAnalyzer>,
        registry: Arc<IncidentRegistry>,
    ) -> Self {
        Self { analyzer, registry }
    }

    /// Classify `submission` and register it under a fresh id.
    pub async fn submit(&self, submission: ReportSubmission) -> Result<IntakeReceipt> {
        let analysis = self.analyzer.analyze(&submission).await;

        let details = ReportDetails {
            description: submission.description,
            latitude: submission.latitude,
            longitude: submission.longitude,
            detected_type: analysis.detected_type.clone(),
            summary_message: analysis.summary_message.clone(),
            has_media: submission.has_media,
        };
        let incident = self.registry.insert(
            Incident::new(IncidentId::generate(), analysis.severity).with_report(details),
        )?;

        if incident.severity == Severity::Critical {
            warn!(
                incident_id = %incident.id,
                detected_type = %analysis.detected_type,
                "priority alert: critical incident reported"
            );
        } else {
            info!(
                incident_id = %incident.id,
                severity = %incident.severity,
                "report accepted"
            );
        }

        Ok(IntakeReceipt { incident, analysis })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::KeywordAnalyzer, incident::IncidentStatus};

    #[tokio::test]
    async fn submit_registers_incident_with_analysis() {
        let registry = Arc::new(IncidentRegistry::new());
        let intake = ReportIntake::new(Arc::new(KeywordAnalyzer), Arc::clone(&registry));

        let receipt = intake
            .submit(ReportSubmission {
                description: "massive fire in the warehouse".into(),
                latitude: 1.5,
                longitude: -2.25,
                has_media: false,
            })
            .await
            .unwrap();

        assert_eq!(receipt.incident.severity, Severity::Critical);
        assert_eq!(receipt.incident.status, IncidentStatus::Received);

        let stored = registry.get(&receipt.incident.id).await.unwrap();
        let report = stored.report.expect("report details stored");
        assert_eq!(report.detected_type, "Fire Station");
        assert_eq!(report.latitude, 1.5);
        assert_eq!(report.summary_message, receipt.analysis.summary_message);
    }
}
