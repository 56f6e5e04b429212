use std::{fmt, sync::Arc};

use resq_config::Config;
use resq_core::{
    IncidentAnalyzer, IncidentRegistry, ReportIntake, StatusFanout,
    SubscriptionManager,
};

#[derive(Clone)]
pub struct AppState {
    fanout: Arc<StatusFanout>,
    intake: Arc<ReportIntake>,
    config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire a fresh registry and subscription set behind the fanout engine
    /// and the intake path.
    pub fn new(config: Arc<Config>, analyzer: Arc<dyn IncidentAnalyzer>) -> Self {
        let registry = Arc::new(IncidentRegistry::new());
        let subscriptions = Arc::new(SubscriptionManager::new());
        let fanout = Arc::new(StatusFanout::new(Arc::clone(&registry), subscriptions));
        let intake = Arc::new(ReportIntake::new(analyzer, registry));

        Self {
            fanout,
            intake,
            config,
        }
    }

    pub fn fanout(&self) -> &Arc<StatusFanout> {
        &self.fanout
    }

    pub fn intake(&self) -> &ReportIntake {
        &self.intake
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
